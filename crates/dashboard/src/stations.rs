//! Station registry
//!
//! A fixed set of observation points covering the NYC region and its
//! approaches, defined once at startup and filtered to the configured
//! bounding region. Stations are never created or destroyed at runtime.

use crate::history::{History, HistoryRecord};
use crate::observation::NormalizedObservation;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    Land,
    Buoy,
}

/// Geographic bounding region of the map plus the highlighted center point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl Default for Region {
    fn default() -> Region {
        Region {
            lat_min: 39.17,
            lat_max: 42.75,
            lon_min: -80.23,
            lon_max: -71.50,
            center_lat: 40.78,
            center_lon: -73.97,
        }
    }
}

impl Region {
    /// Registry filter: keep stations on or inside the south-west corner.
    /// The projection drops anything past the north-east edge per frame.
    pub fn admits(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lon >= self.lon_min
    }
}

#[derive(Debug, Clone)]
pub struct Station {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub kind: StationKind,
    /// Best-known reading from the last successful reconciliation
    pub latest: Option<NormalizedObservation>,
    pub history: History,
}

impl Station {
    pub fn new(id: &str, lat: f64, lon: f64, kind: StationKind) -> Station {
        Station {
            id: id.to_string(),
            lat,
            lon,
            kind,
            latest: None,
            history: History::default(),
        }
    }

    /// Trailing 3 characters of the id, used as the map label
    pub fn short_name(&self) -> &str {
        let start = self.id.len().saturating_sub(3);
        &self.id[start..]
    }

    /// Accept a winning observation: overwrite the latest reading and, when
    /// it carries a timestamp, append it to history.
    pub fn commit(&mut self, obs: NormalizedObservation, now: OffsetDateTime) {
        if let Some(record) = HistoryRecord::from_observation(&obs) {
            self.history.append(record, now);
        }
        self.latest = Some(obs);
    }
}

const LAND: StationKind = StationKind::Land;
const BUOY: StationKind = StationKind::Buoy;

/// Full station table; `build_stations` filters it to the active region.
#[rustfmt::skip]
const REGISTRY: &[(&str, f64, f64, StationKind)] = &[
    ("KPIT", 40.49, -80.23, LAND),
    ("KALB", 42.75, -73.80, LAND),
    ("KBWI", 39.17, -76.67, LAND),

    ("44065", 40.369, -73.703, BUOY),
    ("44025", 40.251, -73.164, BUOY),
    ("44091", 39.770, -73.600, BUOY),
    ("SDHN4", 40.467, -74.009, BUOY),

    ("KEWR", 40.67, -74.24, LAND),
    ("KTEB", 40.92, -74.06, LAND),
    ("KLGA", 40.77, -73.82, LAND),
    ("KJFK", 40.60, -73.74, LAND),
    ("KCDW", 40.90, -74.32, LAND),
    ("KLDJ", 40.55, -74.27, LAND),
    ("KMMU", 40.79, -74.45, LAND),
    ("KSMQ", 40.62, -74.67, LAND),
    ("KBLM", 40.18, -74.05, LAND),

    ("KFRG", 40.73, -73.41, LAND),
    ("KISP", 40.79, -73.10, LAND),
    ("KHWV", 40.82, -72.86, LAND),
    ("KFOK", 40.85, -72.63, LAND),
    ("KHTO", 40.96, -72.25, LAND),
    ("KMTP", 41.07, -71.92, LAND),

    ("KHPN", 41.07, -73.71, LAND),
    ("KSWF", 41.50, -74.10, LAND),
    ("KPOU", 41.62, -73.88, LAND),
    ("KMGJ", 41.51, -74.26, LAND),
    ("KMSV", 41.70, -74.79, LAND),
    ("KDXR", 41.37, -73.48, LAND),
    ("KBDR", 41.16, -73.13, LAND),
    ("KHVN", 41.26, -72.88, LAND),
    ("KFWN", 41.20, -74.62, LAND),
    ("KBDL", 41.93, -72.68, LAND),
    ("KGON", 41.33, -72.05, LAND),
    ("KOXC", 41.48, -73.13, LAND),
    ("KPSF", 42.43, -73.29, LAND),
    ("KBAF", 42.16, -72.71, LAND),

    ("KTTN", 40.28, -74.81, LAND),
    ("KWRI", 40.01, -74.59, LAND),
    ("KNEL", 40.03, -74.35, LAND),
    ("KVAY", 39.94, -74.84, LAND),
    ("KMIV", 39.36, -75.07, LAND),
    ("KACY", 39.45, -74.57, LAND),
    ("KMJX", 39.93, -74.29, LAND),
    ("KOBI", 39.21, -74.80, LAND),

    ("KPHL", 39.87, -75.24, LAND),
    ("KPNE", 40.08, -75.01, LAND),
    ("KLOM", 40.14, -75.26, LAND),
    ("KDYL", 40.33, -75.12, LAND),
    ("KUKT", 40.43, -75.38, LAND),
    ("KABE", 40.65, -75.44, LAND),
    ("KMPO", 41.13, -75.38, LAND),
    ("KRDG", 40.37, -75.96, LAND),
    ("KLNS", 40.12, -76.29, LAND),
    ("KXLL", 40.57, -75.49, LAND),
    ("KCKZ", 40.40, -75.30, LAND),
    ("KPTW", 40.24, -75.56, LAND),
    ("KMQS", 39.98, -75.87, LAND),
    ("KBGM", 42.21, -75.98, LAND),
    ("KAVP", 41.34, -75.73, LAND),
    ("KIPT", 41.24, -76.92, LAND),
    ("KUNV", 40.85, -77.85, LAND),
    ("KELM", 42.16, -76.89, LAND),
    ("KITH", 42.49, -76.46, LAND),
    ("KBFD", 41.80, -78.64, LAND),

    ("KJST", 40.32, -78.83, LAND),
    ("KAOO", 40.30, -78.32, LAND),
    ("KAGC", 40.35, -79.93, LAND),
    ("KLBE", 40.28, -79.41, LAND),
    ("KDUJ", 41.18, -78.90, LAND),
    ("KIDI", 40.63, -79.10, LAND),
    ("KILG", 39.68, -75.61, LAND),
    ("KMRB", 39.40, -77.98, LAND),
    ("KCBE", 39.62, -78.76, LAND),
    ("KTHV", 39.92, -76.87, LAND),
];

/// Materialize the registry entries admitted by the region
pub fn build_stations(region: &Region) -> Vec<Station> {
    REGISTRY
        .iter()
        .filter(|(_, lat, lon, _)| region.admits(*lat, *lon))
        .map(|(id, lat, lon, kind)| Station::new(id, *lat, *lon, *kind))
        .collect()
}
