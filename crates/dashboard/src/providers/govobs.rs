//! api.weather.gov observation source
//!
//! The slow structured fallback for land stations and the only source for
//! buoys. GeoJSON payloads with unit-tagged quantities; wind arrives in
//! km/h and occasionally only inside the raw report text.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use slog::{debug, Logger};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use wxgrid_core::{units, HttpFetcher};

use crate::fusion::ObservationProvider;
use crate::observation::NormalizedObservation;
use crate::providers::mirror::wind_from_report;

const BASE_URL: &str = "https://api.weather.gov";
const TIMEOUT: Duration = Duration::from_secs(5);

pub struct GovObservations {
    logger: Logger,
    fetcher: Arc<HttpFetcher>,
}

impl GovObservations {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>) -> GovObservations {
        GovObservations { logger, fetcher }
    }
}

#[async_trait]
impl ObservationProvider for GovObservations {
    fn name(&self) -> &'static str {
        "gov-observations"
    }

    async fn fetch(&self, station_id: &str) -> Option<NormalizedObservation> {
        let url = format!("{}/stations/{}/observations?limit=1", BASE_URL, station_id);
        let body = match self.fetcher.fetch_text(&url, TIMEOUT).await {
            Ok(body) => body,
            Err(e) => {
                debug!(self.logger, "{}: fetch {} failed: {}", self.name(), station_id, e);
                return None;
            }
        };
        let payload: Value = match serde_json::from_str(&body) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(self.logger, "{}: bad payload for {}: {}", self.name(), station_id, e);
                return None;
            }
        };
        let props = payload["features"].as_array()?.first()?.get("properties")?;
        Some(normalize(props))
    }
}

/// A unit-tagged quantity's numeric value
fn quantity(props: &Value, key: &str) -> Option<f64> {
    props[key]["value"].as_f64()
}

/// Wind speed in m/s: convert the tagged quantity, or mine the raw report
/// when the structured field is null.
fn wind_speed_mps(props: &Value) -> Option<f64> {
    if let Some(speed) = quantity(props, "windSpeed") {
        let unit = props["windSpeed"]["unitCode"].as_str().unwrap_or("");
        if unit.contains("km_h") {
            return Some(units::kmh_to_mps(speed));
        }
        return Some(speed);
    }
    let raw = props["rawMessage"].as_str()?;
    wind_from_report(raw).map(|(_, speed)| speed)
}

fn normalize(props: &Value) -> NormalizedObservation {
    let mut obs = NormalizedObservation {
        timestamp: props["timestamp"]
            .as_str()
            .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok()),
        temperature_c: quantity(props, "temperature"),
        dewpoint_c: quantity(props, "dewpoint"),
        wind_dir_deg: quantity(props, "windDirection"),
        wind_speed_mps: wind_speed_mps(props),
        relative_humidity_pct: quantity(props, "relativeHumidity"),
        pressure_pa: quantity(props, "barometricPressure"),
        visibility_m: quantity(props, "visibility"),
        precip_last_hour_m: quantity(props, "precipitationLastHour"),
        raw_text: props["rawMessage"].as_str().map(str::to_string),
    };
    obs.derive_humidity();
    obs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    #[test]
    fn normalizes_tagged_quantities() {
        let props = json!({
            "timestamp": "2025-06-01T11:51:00+00:00",
            "temperature": {"value": 21.1, "unitCode": "wmoUnit:degC"},
            "dewpoint": {"value": 11.7, "unitCode": "wmoUnit:degC"},
            "windDirection": {"value": 270, "unitCode": "wmoUnit:degree_(angle)"},
            "windSpeed": {"value": 18.36, "unitCode": "wmoUnit:km_h-1"},
            "relativeHumidity": {"value": 55.2, "unitCode": "wmoUnit:percent"},
            "barometricPressure": {"value": 101320, "unitCode": "wmoUnit:Pa"},
            "visibility": {"value": 16090, "unitCode": "wmoUnit:m"},
            "precipitationLastHour": {"value": null},
            "rawMessage": "KJFK 011151Z 27010KT 10SM 21/12 A2992"
        });
        let obs = normalize(&props);

        assert_eq!(obs.timestamp, Some(datetime!(2025-06-01 11:51 UTC)));
        assert_eq!(obs.temperature_c, Some(21.1));
        let wspd = obs.wind_speed_mps.unwrap();
        assert!((wspd - 5.1).abs() < 0.01);
        assert_eq!(obs.relative_humidity_pct, Some(55.2));
        assert_eq!(obs.pressure_pa, Some(101_320.0));
        assert_eq!(obs.precip_last_hour_m, None);
        assert!(obs.is_valid());
    }

    #[test]
    fn null_wind_speed_mined_from_raw_message() {
        let props = json!({
            "timestamp": "2025-06-01T11:51:00+00:00",
            "temperature": {"value": null},
            "windSpeed": {"value": null},
            "rawMessage": "SDHN4 011151Z 18008KT"
        });
        let obs = normalize(&props);

        let wspd = obs.wind_speed_mps.unwrap();
        assert!((wspd - units::knots_to_mps(8.0)).abs() < 1e-9);
        assert!(obs.is_valid());
    }

    #[test]
    fn humidity_derived_when_not_reported() {
        let props = json!({
            "timestamp": "2025-06-01T11:51:00+00:00",
            "temperature": {"value": 20.0},
            "dewpoint": {"value": 10.0},
            "relativeHumidity": {"value": null}
        });
        let obs = normalize(&props);
        let rh = obs.relative_humidity_pct.unwrap();
        assert!(rh > 0.0 && rh < 100.0);
    }
}
