//! aviationweather.gov structured METAR source
//!
//! The fast provider: low latency, JSON payloads, updated frequently for
//! land stations. Knots, statute miles, hectopascals and inches on the
//! wire; everything is normalized to SI here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use slog::{debug, Logger};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use wxgrid_core::{units, HttpFetcher};

use crate::fusion::ObservationProvider;
use crate::observation::NormalizedObservation;

const BASE_URL: &str = "https://aviationweather.gov";
const TIMEOUT: Duration = Duration::from_secs(5);

pub struct AviationWeather {
    logger: Logger,
    fetcher: Arc<HttpFetcher>,
}

impl AviationWeather {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>) -> AviationWeather {
        AviationWeather { logger, fetcher }
    }
}

#[async_trait]
impl ObservationProvider for AviationWeather {
    fn name(&self) -> &'static str {
        "aviation-weather"
    }

    async fn fetch(&self, station_id: &str) -> Option<NormalizedObservation> {
        let url = format!(
            "{}/api/data/metar?ids={}&format=json",
            BASE_URL, station_id
        );
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
        let entry = payload.as_array()?.first()?;
        let mut obs = normalize(entry);
        obs.derive_humidity();
        Some(obs)
    }
}

/// Lenient numeric extraction: the API serves numbers, numeric strings,
/// and markers like `"VRB"` or `"10+"` in the same fields.
fn num(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `obsTime` arrives either as epoch seconds or as a date-time string with
/// a space separator and sometimes no zone suffix.
fn parse_obs_time(value: &Value) -> Option<OffsetDateTime> {
    match value {
        Value::Number(n) => OffsetDateTime::from_unix_timestamp(n.as_i64()?).ok(),
        Value::String(s) => {
            let mut cleaned = s.trim().replace(' ', "T");
            if !cleaned.ends_with('Z') && !cleaned.contains('+') {
                cleaned.push('Z');
            }
            OffsetDateTime::parse(&cleaned, &Rfc3339).ok()
        }
        _ => None,
    }
}

fn normalize(entry: &Value) -> NormalizedObservation {
    NormalizedObservation {
        timestamp: parse_obs_time(&entry["obsTime"]),
        temperature_c: num(&entry["temp"]),
        dewpoint_c: num(&entry["dewp"]),
        wind_dir_deg: num(&entry["wdir"]),
        wind_speed_mps: num(&entry["wspd"]).map(units::knots_to_mps),
        relative_humidity_pct: None,
        pressure_pa: num(&entry["altim"]).map(units::hectopascals_to_pascals),
        visibility_m: num(&entry["visib"]).map(units::statute_miles_to_meters),
        precip_last_hour_m: num(&entry["precip"]).map(units::inches_to_meters),
        raw_text: entry["rawOb"].as_str().map(str::to_string),
    }
}
