//! Meteorological unit conversions
//!
//! Observations are normalized to SI at ingestion (°C, m/s, Pa, m); the
//! display layer converts to the units shown on the map.

const KNOTS_TO_MPS: f64 = 0.514444;
const KMH_TO_MPS: f64 = 0.277778;

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    (c * 9.0 / 5.0) + 32.0
}

/// Convert a temperature *delta* (not an absolute reading)
pub fn celsius_delta_to_fahrenheit(dc: f64) -> f64 {
    dc * 9.0 / 5.0
}

pub fn knots_to_mps(kt: f64) -> f64 {
    kt * KNOTS_TO_MPS
}

pub fn kmh_to_mps(kmh: f64) -> f64 {
    kmh * KMH_TO_MPS
}

pub fn mps_to_mph(mps: f64) -> f64 {
    mps * 2.23694
}

pub fn meters_to_miles(m: f64) -> f64 {
    m * 0.000621371
}

pub fn statute_miles_to_meters(mi: f64) -> f64 {
    mi * 1609.34
}

pub fn pascals_to_inhg(pa: f64) -> f64 {
    pa * 0.0002953
}

pub fn inhg_to_pascals(inhg: f64) -> f64 {
    inhg * 3386.39
}

pub fn hectopascals_to_pascals(hpa: f64) -> f64 {
    hpa * 100.0
}

pub fn inches_to_meters(inches: f64) -> f64 {
    inches * 0.0254
}

pub fn meters_to_inches(m: f64) -> f64 {
    m * 39.3701
}

/// Relative humidity (%) from temperature and dewpoint via the Magnus
/// approximation (a = 17.625, b = 243.04).
pub fn relative_humidity(temp_c: f64, dewpoint_c: f64) -> f64 {
    const A: f64 = 17.625;
    const B: f64 = 243.04;
    let num = ((A * dewpoint_c) / (B + dewpoint_c)).exp();
    let den = ((A * temp_c) / (B + temp_c)).exp();
    100.0 * (num / den)
}

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass name for a bearing in degrees true
pub fn compass_point(degrees: f64) -> &'static str {
    let ix = ((degrees + 11.25) / 22.5) as isize;
    COMPASS_POINTS[ix.rem_euclid(16) as usize]
}
