//! Shared observation vocabulary
//!
//! Every provider payload is normalized into this shape at the fetch
//! boundary: SI units throughout (°C, m/s, Pa, m), with absent fields as
//! `None` rather than sentinel values.

use time::{Duration, OffsetDateTime};
use wxgrid_core::units;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedObservation {
    /// Provider-reported observation time; absent when the payload carried
    /// none or it failed to parse.
    pub timestamp: Option<OffsetDateTime>,
    pub temperature_c: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    /// Always m/s, whatever unit the provider reported.
    pub wind_speed_mps: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
    pub pressure_pa: Option<f64>,
    pub visibility_m: Option<f64>,
    pub precip_last_hour_m: Option<f64>,
    /// Raw report text, kept for diagnostics only.
    pub raw_text: Option<String>,
}

impl NormalizedObservation {
    /// An observation lacking both temperature and wind speed carries
    /// nothing worth fusing; it is treated as absent even when otherwise
    /// well-formed.
    pub fn is_valid(&self) -> bool {
        self.temperature_c.is_some() || self.wind_speed_mps.is_some()
    }

    pub fn age(&self, now: OffsetDateTime) -> Option<Duration> {
        self.timestamp.map(|ts| now - ts)
    }

    /// Fill relative humidity from the dewpoint formula when the provider
    /// did not report it directly.
    pub fn derive_humidity(&mut self) {
        if self.relative_humidity_pct.is_none() {
            if let (Some(t), Some(dp)) = (self.temperature_c, self.dewpoint_c) {
                self.relative_humidity_pct = Some(units::relative_humidity(t, dp));
            }
        }
    }
}
