//! Multi-source fusion engine
//!
//! Per station and cycle, queries up to three providers under a
//! short-circuit fallback policy and arbitrates the candidates by reported
//! timestamp. Provider failures never escape a cycle; every failure mode
//! collapses to absence for that provider alone.

use std::sync::Arc;

use async_trait::async_trait;
use slog::{debug, Logger};
use time::{Duration, OffsetDateTime};

use crate::observation::NormalizedObservation;
use crate::stations::StationKind;

/// One upstream observation source. Implementations must swallow all
/// transport and parse failures; absence is the only failure surface.
#[async_trait]
pub trait ObservationProvider: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn fetch(&self, station_id: &str) -> Option<NormalizedObservation>;
}

/// Observations younger than this from the fast provider win outright,
/// skipping the remaining providers for the cycle.
pub const FRESHNESS_BAR: Duration = Duration::minutes(20);

pub struct FusionEngine {
    logger: Logger,
    /// Fast structured source, authoritative when fresh
    fast: Arc<dyn ObservationProvider>,
    /// Plain-text METAR mirror, second in line
    mirror: Arc<dyn ObservationProvider>,
    /// Slow structured source; last resort for land, only source for buoys
    fallback: Arc<dyn ObservationProvider>,
    freshness_bar: Duration,
}

impl FusionEngine {
    pub fn new(
        logger: Logger,
        fast: Arc<dyn ObservationProvider>,
        mirror: Arc<dyn ObservationProvider>,
        fallback: Arc<dyn ObservationProvider>,
    ) -> FusionEngine {
        FusionEngine {
            logger,
            fast,
            mirror,
            fallback,
            freshness_bar: FRESHNESS_BAR,
        }
    }

    /// Reconcile one station for this cycle. `None` leaves the station
    /// untouched by the caller.
    pub async fn reconcile(
        &self,
        station_id: &str,
        kind: StationKind,
        now: OffsetDateTime,
    ) -> Option<NormalizedObservation> {
        if kind == StationKind::Buoy {
            // Buoys report through the slow source only
            let result = self
                .fallback
                .fetch(station_id)
                .await
                .filter(NormalizedObservation::is_valid);
            if result.is_some() {
                debug!(
                    self.logger,
                    "reconciled {} via {}",
                    station_id,
                    self.fallback.name()
                );
            }
            return result;
        }

        let fast_result = self.fast.fetch(station_id).await;
        let fast_fresh = fast_result.as_ref().is_some_and(|obs| {
            obs.is_valid()
                && obs
                    .age(now)
                    .is_some_and(|age| age < self.freshness_bar)
        });

        let mirror_result = if fast_fresh {
            None
        } else {
            self.mirror.fetch(station_id).await
        };
        let mirror_valid = mirror_result
            .as_ref()
            .is_some_and(NormalizedObservation::is_valid);

        let fallback_result = if fast_fresh || mirror_valid {
            None
        } else {
            self.fallback.fetch(station_id).await
        };

        let winner = select_latest([
            (self.fast.name(), fast_result),
            (self.mirror.name(), mirror_result),
            (self.fallback.name(), fallback_result),
        ]);
        if let Some((name, obs)) = winner {
            debug!(self.logger, "reconciled {} via {}", station_id, name);
            return Some(obs);
        }
        debug!(self.logger, "no valid observation for {}", station_id);
        None
    }
}

/// Arbitrate queried candidates by reported timestamp. A left-to-right scan
/// with `>=` comparison, so later providers win ties; candidates without a
/// timestamp never win.
pub fn select_latest<const N: usize>(
    candidates: [(&'static str, Option<NormalizedObservation>); N],
) -> Option<(&'static str, NormalizedObservation)> {
    let mut best: Option<(&'static str, NormalizedObservation)> = None;
    let mut best_ts = OffsetDateTime::UNIX_EPOCH;
    for (name, candidate) in candidates {
        let Some(obs) = candidate else { continue };
        if !obs.is_valid() {
            continue;
        }
        let Some(ts) = obs.timestamp else { continue };
        if best.is_none() || ts >= best_ts {
            best_ts = ts;
            best = Some((name, obs));
        }
    }
    best
}
