use std::sync::Arc;

use async_trait::async_trait;
use dashboard::{FusionEngine, NormalizedObservation, ObservationProvider, StationKind};
use mockall::mock;
use slog::{o, Discard, Logger};
use time::{macros::datetime, Duration, OffsetDateTime};

mock! {
    Provider {}

    #[async_trait]
    impl ObservationProvider for Provider {
        fn name(&self) -> &'static str;
        async fn fetch(&self, station_id: &str) -> Option<NormalizedObservation>;
    }
}

const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

fn test_logger() -> Logger {
    Logger::root(Discard, o!())
}

fn valid_obs(ts: OffsetDateTime, temp: f64) -> NormalizedObservation {
    NormalizedObservation {
        timestamp: Some(ts),
        temperature_c: Some(temp),
        ..Default::default()
    }
}

/// Well-formed but carries neither temperature nor wind
fn invalid_obs(ts: OffsetDateTime) -> NormalizedObservation {
    NormalizedObservation {
        timestamp: Some(ts),
        pressure_pa: Some(101_325.0),
        ..Default::default()
    }
}

fn named(mut provider: MockProvider, name: &'static str) -> MockProvider {
    provider.expect_name().return_const(name);
    provider
}

#[tokio::test]
async fn fresh_fast_result_short_circuits_remaining_providers() {
    let fresh = valid_obs(NOW - Duration::minutes(5), 21.0);

    let mut fast = MockProvider::new();
    let returned = fresh.clone();
    fast.expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let mut mirror = MockProvider::new();
    mirror.expect_fetch().times(0);
    let mut fallback = MockProvider::new();
    fallback.expect_fetch().times(0);

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("KJFK", StationKind::Land, NOW).await;
    assert_eq!(result, Some(fresh));
}

#[tokio::test]
async fn absent_fast_falls_back_to_mirror_without_touching_third() {
    let mirror_obs = valid_obs(NOW - Duration::minutes(40), 18.0);

    let mut fast = MockProvider::new();
    fast.expect_fetch().times(1).returning(|_| None);

    let mut mirror = MockProvider::new();
    let returned = mirror_obs.clone();
    mirror
        .expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let mut fallback = MockProvider::new();
    fallback.expect_fetch().times(0);

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("KTEB", StationKind::Land, NOW).await;
    assert_eq!(result, Some(mirror_obs));
}

#[tokio::test]
async fn invalid_candidates_fall_through_to_third_provider() {
    let fallback_obs = valid_obs(NOW - Duration::minutes(50), 17.0);

    let mut fast = MockProvider::new();
    fast.expect_fetch()
        .times(1)
        .returning(|_| Some(invalid_obs(NOW - Duration::minutes(5))));

    let mut mirror = MockProvider::new();
    mirror
        .expect_fetch()
        .times(1)
        .returning(|_| Some(invalid_obs(NOW - Duration::minutes(10))));

    let mut fallback = MockProvider::new();
    let returned = fallback_obs.clone();
    fallback
        .expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("KPHL", StationKind::Land, NOW).await;
    assert_eq!(result, Some(fallback_obs));
}

#[tokio::test]
async fn stale_fast_result_still_wins_arbitration_when_latest() {
    // Fast is past the freshness bar, so the mirror is consulted, but the
    // fast result carries the later timestamp and wins the cycle.
    let fast_obs = valid_obs(NOW - Duration::minutes(30), 21.0);
    let mirror_obs = valid_obs(NOW - Duration::minutes(90), 18.0);

    let mut fast = MockProvider::new();
    let returned = fast_obs.clone();
    fast.expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let mut mirror = MockProvider::new();
    let returned = mirror_obs.clone();
    mirror
        .expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let mut fallback = MockProvider::new();
    fallback.expect_fetch().times(0);

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("KALB", StationKind::Land, NOW).await;
    assert_eq!(result, Some(fast_obs));
}

#[tokio::test]
async fn buoys_query_only_the_tolerant_provider() {
    let buoy_obs = valid_obs(NOW - Duration::minutes(45), 16.0);

    let mut fast = MockProvider::new();
    fast.expect_fetch().times(0);
    let mut mirror = MockProvider::new();
    mirror.expect_fetch().times(0);

    let mut fallback = MockProvider::new();
    let returned = buoy_obs.clone();
    fallback
        .expect_fetch()
        .times(1)
        .returning(move |_| Some(returned.clone()));

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("44065", StationKind::Buoy, NOW).await;
    assert_eq!(result, Some(buoy_obs));
}

#[tokio::test]
async fn all_providers_absent_yields_absence() {
    let mut fast = MockProvider::new();
    fast.expect_fetch().times(1).returning(|_| None);
    let mut mirror = MockProvider::new();
    mirror.expect_fetch().times(1).returning(|_| None);
    let mut fallback = MockProvider::new();
    fallback.expect_fetch().times(1).returning(|_| None);

    let engine = FusionEngine::new(
        test_logger(),
        Arc::new(named(fast, "fast")),
        Arc::new(named(mirror, "mirror")),
        Arc::new(named(fallback, "fallback")),
    );

    let result = engine.reconcile("KBWI", StationKind::Land, NOW).await;
    assert_eq!(result, None);
}
