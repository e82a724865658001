//! Plain-text METAR mirror (tgftp.nws.noaa.gov)
//!
//! Second in the fallback chain. Serves one bare METAR line per station;
//! the timestamp carries only day-of-month and time, so the month and year
//! are reconstructed against the wall clock with a rollback for reports
//! straddling a month boundary.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use slog::{debug, Logger};
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use wxgrid_core::{units, HttpFetcher};

use crate::fusion::ObservationProvider;
use crate::observation::NormalizedObservation;

const BASE_URL: &str = "https://tgftp.nws.noaa.gov";
const TIMEOUT: Duration = Duration::from_secs(3);

static REPORT_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{2})(\d{4})Z\b").unwrap());
static WIND_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{3}|VRB)(\d{2,3})(?:G\d{2,3})?(KT|MPS|KMH)\b").unwrap());
static TEMP_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(M?\d{2})/(M?\d{2})\b").unwrap());
static ALTIMETER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bA(\d{4})\b").unwrap());

pub struct MetarMirror {
    logger: Logger,
    fetcher: Arc<HttpFetcher>,
}

impl MetarMirror {
    pub fn new(logger: Logger, fetcher: Arc<HttpFetcher>) -> MetarMirror {
        MetarMirror { logger, fetcher }
    }
}

#[async_trait]
impl ObservationProvider for MetarMirror {
    fn name(&self) -> &'static str {
        "metar-mirror"
    }

    async fn fetch(&self, station_id: &str) -> Option<NormalizedObservation> {
        let url = format!(
            "{}/data/observations/metar/stations/{}.TXT",
            BASE_URL, station_id
        );
        let body = match self.fetcher.fetch_text(&url, TIMEOUT).await {
            Ok(body) => body,
            Err(e) => {
                debug!(self.logger, "{}: fetch {} failed: {}", self.name(), station_id, e);
                return None;
            }
        };
        // First line is the mirror's own date stamp, second is the report
        let report = body.lines().nth(1)?;
        parse_metar(report, OffsetDateTime::now_utc())
    }
}

/// Wind group from a raw report: (direction degrees, speed m/s).
/// Variable-direction winds report 0°.
pub(crate) fn wind_from_report(raw: &str) -> Option<(f64, f64)> {
    let caps = WIND_GROUP.captures(raw)?;
    let dir = if &caps[1] == "VRB" {
        0.0
    } else {
        caps[1].parse().ok()?
    };
    let speed: f64 = caps[2].parse().ok()?;
    let speed_mps = match &caps[3] {
        "KT" => units::knots_to_mps(speed),
        "KMH" => units::kmh_to_mps(speed),
        _ => speed,
    };
    Some((dir, speed_mps))
}

fn parse_temp_element(s: &str) -> Option<f64> {
    if let Some(rest) = s.strip_prefix('M') {
        rest.parse::<f64>().ok().map(|v| -v)
    } else {
        s.parse().ok()
    }
}

/// Reconstruct the report time from a `ddhhmmZ` group. The month and year
/// come from `now`, rolled back one month when the day-of-month runs ahead
/// of the calendar.
fn report_timestamp(raw: &str, now: OffsetDateTime) -> Option<OffsetDateTime> {
    let caps = REPORT_TIME.captures(raw)?;
    let day: u8 = caps[1].parse().ok()?;
    let hhmm = &caps[2];
    let hour: u8 = hhmm[..2].parse().ok()?;
    let minute: u8 = hhmm[2..].parse().ok()?;

    let (mut year, mut month) = (now.year(), now.month());
    if day > now.day() + 1 {
        month = month.previous();
        if month == time::Month::December {
            year -= 1;
        }
    }

    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, 0).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}

/// Parse one raw METAR line. Reports too short to be real, or with nothing
/// parseable, yield `None`; a missing time group falls back to `now`.
pub fn parse_metar(raw: &str, now: OffsetDateTime) -> Option<NormalizedObservation> {
    if raw.len() < 10 {
        return None;
    }

    let timestamp = report_timestamp(raw, now).or(Some(now));
    let wind = wind_from_report(raw);
    let temps = TEMP_GROUP
        .captures(raw)
        .and_then(|caps| Some((parse_temp_element(&caps[1])?, parse_temp_element(&caps[2])?)));
    let pressure_pa = ALTIMETER
        .captures(raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|hundredths| units::inhg_to_pascals(hundredths / 100.0));

    let mut obs = NormalizedObservation {
        timestamp,
        temperature_c: temps.map(|(t, _)| t),
        dewpoint_c: temps.map(|(_, d)| d),
        wind_dir_deg: wind.map(|(d, _)| d),
        wind_speed_mps: wind.map(|(_, s)| s),
        relative_humidity_pct: None,
        pressure_pa,
        visibility_m: None,
        precip_last_hour_m: None,
        raw_text: Some(raw.trim().to_string()),
    };
    obs.derive_humidity();
    Some(obs)
}
