//! Grid renderer
//!
//! Projects stations into a fixed character grid, places two-line labels
//! without overlap, and formats the per-mode value strings. Produces a
//! styled cell matrix; mapping styles to ANSI colors is the presentation
//! layer's job.

use std::cmp::Ordering;

use time::{Duration, OffsetDateTime};
use wxgrid_core::units;

use crate::history::{Field, Trend};
use crate::mode::DisplayMode;
use crate::stations::{Region, Station, StationKind};

pub const MAP_WIDTH: usize = 90;
pub const MAP_HEIGHT: usize = 30;

/// Direct-field modes look back at most this far for a value
const VALUE_LOOKBACK: Duration = Duration::minutes(90);

/// Placeholder shown for an expired station in every mode
const EXPIRED_VALUE: &str = "-";

/// Staleness of a station's latest reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBand {
    /// Under 20 minutes
    Fresh,
    /// 20 to 60 minutes
    Aging,
    /// 60 to 120 minutes
    Stale,
    /// Over two hours, or no timestamp at all
    Expired,
}

impl AgeBand {
    pub fn classify(timestamp: Option<OffsetDateTime>, now: OffsetDateTime) -> AgeBand {
        let Some(ts) = timestamp else {
            return AgeBand::Expired;
        };
        let age = now - ts;
        if age > Duration::minutes(120) {
            AgeBand::Expired
        } else if age > Duration::minutes(60) {
            AgeBand::Stale
        } else if age > Duration::minutes(20) {
            AgeBand::Aging
        } else {
            AgeBand::Fresh
        }
    }
}

/// Visual treatment of one cell, resolved to color/attributes downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    /// Station name slice, tinted by observation age
    Band(AgeBand),
    /// Buoy value slice accent
    Accent,
    /// Map center marker
    Marker,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub style: CellStyle,
}

impl Cell {
    pub const BLANK: Cell = Cell {
        ch: ' ',
        style: CellStyle::Plain,
    };

    pub fn is_blank(&self) -> bool {
        self.ch == ' '
    }
}

/// One rendered frame: the cell matrix plus title metadata
#[derive(Debug, Clone)]
pub struct Frame {
    pub cells: Vec<Vec<Cell>>,
    pub mode: DisplayMode,
    /// Seconds until the armed mode reverts, when one is armed
    pub revert_in: Option<i64>,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn title(&self) -> String {
        match self.revert_in {
            Some(secs) => format!("[{}] MAP (Revert: {}s)", self.mode.token(), secs),
            None => format!("[{}] MAP", self.mode.token()),
        }
    }
}

/// Projection from the geographic region onto the integer grid
#[derive(Debug, Clone, Copy)]
pub struct GridGeometry {
    pub width: usize,
    pub height: usize,
    pub region: Region,
}

impl GridGeometry {
    pub fn new(width: usize, height: usize, region: Region) -> GridGeometry {
        GridGeometry {
            width,
            height,
            region,
        }
    }

    /// Linear interpolation into (row, col); `None` when the projected
    /// cell falls outside the grid.
    pub fn project(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let r = &self.region;
        if r.lat_max == r.lat_min || r.lon_max == r.lon_min {
            return None;
        }
        let y_norm = (lat - r.lat_min) / (r.lat_max - r.lat_min);
        let row = ((1.0 - y_norm) * (self.height - 1) as f64) as i64;
        let x_norm = (lon - r.lon_min) / (r.lon_max - r.lon_min);
        let col = (x_norm * (self.width - 1) as f64) as i64;

        if row >= 0 && (row as usize) < self.height && col >= 0 && (col as usize) < self.width {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }
}

impl Default for GridGeometry {
    fn default() -> GridGeometry {
        GridGeometry::new(MAP_WIDTH, MAP_HEIGHT, Region::default())
    }
}

/// Candidate label anchors relative to the projected cell, in preference
/// order. Land labels lean left/above the point; buoy labels lean
/// right/below, toward open water on the map.
const LAND_OFFSETS: [(i32, i32); 10] = [
    (0, 0),
    (0, -4),
    (-1, -4),
    (1, -4),
    (0, -8),
    (-1, 0),
    (1, 0),
    (2, 0),
    (-2, 0),
    (0, 4),
];
const BUOY_OFFSETS: [(i32, i32); 8] = [
    (0, 0),
    (0, 4),
    (0, 8),
    (1, 4),
    (-1, 4),
    (0, -4),
    (1, 0),
    (-1, 0),
];

pub struct GridRenderer {
    geometry: GridGeometry,
}

impl GridRenderer {
    pub fn new(geometry: GridGeometry) -> GridRenderer {
        GridRenderer { geometry }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Render one frame. Stations are placed north to south so that
    /// northern labels claim contested space first; a station whose label
    /// cannot be placed without overlap is omitted for this frame only.
    pub fn render(
        &self,
        stations: &[Station],
        mode: DisplayMode,
        revert_in: Option<Duration>,
        now: OffsetDateTime,
    ) -> Frame {
        let mut cells = vec![vec![Cell::BLANK; self.geometry.width]; self.geometry.height];

        let mut ordered: Vec<&Station> = stations.iter().collect();
        ordered.sort_by(|a, b| b.lat.partial_cmp(&a.lat).unwrap_or(Ordering::Equal));

        for station in ordered {
            let band = AgeBand::classify(
                station.latest.as_ref().and_then(|o| o.timestamp),
                now,
            );
            let value = if band == AgeBand::Expired {
                EXPIRED_VALUE.to_string()
            } else {
                format_value(station, mode, band == AgeBand::Fresh, now)
            };
            let label = format!("[{}]", value);
            let name = station.short_name();

            let Some((row, col)) = self.geometry.project(station.lat, station.lon) else {
                continue;
            };
            let Some((anchor_row, anchor_col)) =
                find_position(&cells, row, col, name.len(), label.len(), station.kind)
            else {
                continue;
            };

            for (i, ch) in name.chars().enumerate() {
                cells[anchor_row - 1][anchor_col + i] = Cell {
                    ch,
                    style: CellStyle::Band(band),
                };
            }
            let value_style = match station.kind {
                StationKind::Buoy => CellStyle::Accent,
                StationKind::Land => CellStyle::Plain,
            };
            for (i, ch) in label.chars().enumerate() {
                cells[anchor_row][anchor_col + i] = Cell {
                    ch,
                    style: value_style,
                };
            }
        }

        // Center marker, only where nothing else landed
        let region = self.geometry.region;
        if let Some((row, col)) = self.geometry.project(region.center_lat, region.center_lon) {
            if cells[row][col].is_blank() {
                cells[row][col] = Cell {
                    ch: '+',
                    style: CellStyle::Marker,
                };
            }
        }

        Frame {
            cells,
            mode,
            revert_in: revert_in.map(Duration::whole_seconds),
        }
    }
}

fn slice_collides(cells: &[Vec<Cell>], row: i32, col: i32, len: usize) -> bool {
    if row < 0 || row as usize >= cells.len() {
        return true;
    }
    let width = cells[row as usize].len();
    for i in 0..len {
        let c = col + i as i32;
        if c as usize >= width {
            return true;
        }
        if !cells[row as usize][c as usize].is_blank() {
            return true;
        }
    }
    false
}

/// First candidate anchor whose name and value slices are both in-bounds
/// and unoccupied. The returned row is the value row; the name sits one
/// row above.
fn find_position(
    cells: &[Vec<Cell>],
    row: usize,
    col: usize,
    name_len: usize,
    value_len: usize,
    kind: StationKind,
) -> Option<(usize, usize)> {
    let offsets: &[(i32, i32)] = match kind {
        StationKind::Land => &LAND_OFFSETS,
        StationKind::Buoy => &BUOY_OFFSETS,
    };
    let height = cells.len() as i32;
    let width = cells.first().map_or(0, Vec::len) as i32;

    for (dr, dc) in offsets {
        let nr = row as i32 + dr;
        let nc = col as i32 + dc;
        if nr - 1 < 0 || nr >= height || nc < 0 || nc >= width {
            continue;
        }
        if slice_collides(cells, nr - 1, nc, name_len) {
            continue;
        }
        if slice_collides(cells, nr, nc, value_len) {
            continue;
        }
        return Some((nr as usize, nc as usize));
    }
    None
}

/// Format the value string for one station under the active mode. Absent
/// values become fixed placeholder glyphs, never errors.
fn format_value(station: &Station, mode: DisplayMode, is_fresh: bool, now: OffsetDateTime) -> String {
    let lookback = |field| station.history.latest_within(field, VALUE_LOOKBACK, now);
    match mode {
        DisplayMode::Temperature => match lookback(Field::Temperature) {
            Some(v) if is_fresh => format!("{:.1}", units::celsius_to_fahrenheit(v)),
            Some(v) => format!("{}", units::celsius_to_fahrenheit(v) as i64),
            None => "-".to_string(),
        },
        DisplayMode::WindSpeed => match lookback(Field::WindSpeed) {
            Some(v) => format!("{}", units::mps_to_mph(v) as i64),
            None => "?".to_string(),
        },
        DisplayMode::WindDirection => match lookback(Field::WindDirection) {
            Some(v) => units::compass_point(v).to_string(),
            None => "?".to_string(),
        },
        DisplayMode::Humidity => match lookback(Field::Humidity) {
            Some(v) => format!("{}%", v as i64),
            None => "-".to_string(),
        },
        // Dewpoint only shows while the reading is fresh
        DisplayMode::Dewpoint => match lookback(Field::Dewpoint) {
            Some(v) if is_fresh => format!("{:.1}", units::celsius_to_fahrenheit(v)),
            _ => "-".to_string(),
        },
        DisplayMode::Precip(hours) => match station.history.accumulation(hours) {
            None => "?".to_string(),
            Some(total) if total == 0.0 => "0".to_string(),
            Some(total) => format!("{:.2}", units::meters_to_inches(total)),
        },
        DisplayMode::Trend(hours) => match station.history.trend(hours) {
            Trend::NoAnchor => "?".to_string(),
            Trend::NoMatch => ".".to_string(),
            Trend::Delta(delta_c) => {
                let delta_f = units::celsius_delta_to_fahrenheit(delta_c) as i64;
                if delta_c > 0.0 {
                    format!("+{}", delta_f)
                } else {
                    format!("{}", delta_f)
                }
            }
        },
        // Hundredths of inHg, last two digits: 29.92 -> "92"
        DisplayMode::Pressure => match lookback(Field::Pressure) {
            Some(v) => format!("{:02}", (units::pascals_to_inhg(v) * 100.0) as i64 % 100),
            None => "-".to_string(),
        },
        DisplayMode::Visibility => match lookback(Field::Visibility) {
            Some(v) => format!("{}", units::meters_to_miles(v) as i64),
            None => "-".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryRecord;
    use crate::observation::NormalizedObservation;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

    fn test_region() -> Region {
        Region {
            lat_min: 39.0,
            lat_max: 43.0,
            lon_min: -80.0,
            lon_max: -71.0,
            center_lat: 40.78,
            center_lon: -73.97,
        }
    }

    fn observed_station(id: &str, lat: f64, lon: f64, ts: OffsetDateTime) -> Station {
        let mut station = Station::new(id, lat, lon, StationKind::Land);
        let obs = NormalizedObservation {
            timestamp: Some(ts),
            temperature_c: Some(20.0),
            wind_speed_mps: Some(5.0),
            ..Default::default()
        };
        station.commit(obs, NOW);
        station
    }

    #[test]
    fn age_bands_follow_thresholds() {
        let at = |mins: i64| Some(NOW - Duration::minutes(mins));
        assert_eq!(AgeBand::classify(at(5), NOW), AgeBand::Fresh);
        assert_eq!(AgeBand::classify(at(30), NOW), AgeBand::Aging);
        assert_eq!(AgeBand::classify(at(90), NOW), AgeBand::Stale);
        assert_eq!(AgeBand::classify(at(150), NOW), AgeBand::Expired);
        assert_eq!(AgeBand::classify(None, NOW), AgeBand::Expired);
    }

    #[test]
    fn projection_drops_out_of_bounds() {
        let geometry = GridGeometry::new(90, 30, test_region());
        assert!(geometry.project(41.0, -74.0).is_some());
        assert!(geometry.project(50.0, -74.0).is_none());
        assert!(geometry.project(41.0, -60.0).is_none());
    }

    #[test]
    fn projection_is_north_up() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let (north_row, _) = geometry.project(42.5, -74.0).unwrap();
        let (south_row, _) = geometry.project(39.5, -74.0).unwrap();
        assert!(north_row < south_row);
    }

    #[test]
    fn adjacent_stations_never_overlap() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let renderer = GridRenderer::new(geometry);
        let ts = NOW - Duration::minutes(5);
        // Two stations projecting to nearly the same cell
        let north = observed_station("KAAA", 41.01, -74.0, ts);
        let south = observed_station("KBBB", 40.99, -74.0, ts);
        let stations = vec![south.clone(), north.clone()];

        let frame = renderer.render(&stations, DisplayMode::Temperature, None, NOW);

        // Both placed: each label is 3 name chars + bracketed value
        let non_blank: usize = frame
            .cells
            .iter()
            .flatten()
            .filter(|c| !c.is_blank() && c.style != CellStyle::Marker)
            .count();
        let expected = 2 * 3 + 2 * "[68.0]".len();
        assert_eq!(non_blank, expected);
    }

    #[test]
    fn northern_station_claims_contested_slot() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let renderer = GridRenderer::new(geometry);
        let ts = NOW - Duration::minutes(5);
        let north = observed_station("KAAA", 41.01, -74.0, ts);
        let south = observed_station("KBBB", 40.99, -74.0, ts);
        let (north_row, north_col) = geometry.project(north.lat, north.lon).unwrap();

        // Input order must not matter; latitude decides
        let frame = renderer.render(
            &vec![south.clone(), north.clone()],
            DisplayMode::Temperature,
            None,
            NOW,
        );

        // The northern station got its first-choice anchor: value at its
        // projected cell, name directly above
        let value_row: String = frame.cells[north_row][north_col..north_col + 6]
            .iter()
            .map(|c| c.ch)
            .collect();
        assert_eq!(value_row, "[68.0]");
        let name_row: String = frame.cells[north_row - 1][north_col..north_col + 3]
            .iter()
            .map(|c| c.ch)
            .collect();
        assert_eq!(name_row, "AAA");
    }

    #[test]
    fn unplaceable_station_is_omitted_not_overwritten() {
        // A one-station-tall grid cannot host the name row above row 0
        let geometry = GridGeometry::new(12, 1, test_region());
        let renderer = GridRenderer::new(geometry);
        let ts = NOW - Duration::minutes(5);
        let station = observed_station("KAAA", 41.0, -74.0, ts);

        let frame = renderer.render(&[station], DisplayMode::Temperature, None, NOW);
        let non_blank = frame
            .cells
            .iter()
            .flatten()
            .filter(|c| !c.is_blank() && c.style != CellStyle::Marker)
            .count();
        assert_eq!(non_blank, 0);
    }

    #[test]
    fn expired_station_shows_placeholder_in_every_mode() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let renderer = GridRenderer::new(geometry);
        let station = observed_station("KAAA", 41.0, -74.0, NOW - Duration::minutes(180));
        let (row, col) = geometry.project(41.0, -74.0).unwrap();

        for mode in [
            DisplayMode::Temperature,
            DisplayMode::WindSpeed,
            DisplayMode::Precip(3),
            DisplayMode::Trend(6),
        ] {
            let frame = renderer.render(std::slice::from_ref(&station), mode, None, NOW);
            let label: String = frame.cells[row][col..col + 3].iter().map(|c| c.ch).collect();
            assert_eq!(label, "[-]");
            assert_eq!(
                frame.cells[row - 1][col].style,
                CellStyle::Band(AgeBand::Expired)
            );
        }
    }

    #[test]
    fn fresh_temperature_has_decimal_stale_does_not() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let renderer = GridRenderer::new(geometry);
        let (row, col) = geometry.project(41.0, -74.0).unwrap();

        let fresh = observed_station("KAAA", 41.0, -74.0, NOW - Duration::minutes(5));
        let frame = renderer.render(&[fresh], DisplayMode::Temperature, None, NOW);
        let label: String = frame.cells[row][col..col + 6].iter().map(|c| c.ch).collect();
        assert_eq!(label, "[68.0]");

        let aging = observed_station("KBBB", 41.0, -74.0, NOW - Duration::minutes(45));
        let frame = renderer.render(&[aging], DisplayMode::Temperature, None, NOW);
        let label: String = frame.cells[row][col..col + 4].iter().map(|c| c.ch).collect();
        assert_eq!(label, "[68]");
    }

    #[test]
    fn center_marker_only_on_blank_cell() {
        let geometry = GridGeometry::default();
        let renderer = GridRenderer::new(geometry);
        let frame = renderer.render(&[], DisplayMode::Temperature, None, NOW);
        let (row, col) = geometry
            .project(geometry.region.center_lat, geometry.region.center_lon)
            .unwrap();
        assert_eq!(frame.cells[row][col].ch, '+');
        assert_eq!(frame.cells[row][col].style, CellStyle::Marker);
    }

    #[test]
    fn buoy_value_slice_uses_accent_style() {
        let geometry = GridGeometry::new(90, 30, test_region());
        let renderer = GridRenderer::new(geometry);
        let mut buoy = Station::new("44065", 40.37, -73.70, StationKind::Buoy);
        buoy.commit(
            NormalizedObservation {
                timestamp: Some(NOW - Duration::minutes(5)),
                wind_speed_mps: Some(6.0),
                ..Default::default()
            },
            NOW,
        );
        let (row, col) = geometry.project(buoy.lat, buoy.lon).unwrap();

        let frame = renderer.render(&[buoy], DisplayMode::WindSpeed, None, NOW);
        assert_eq!(frame.cells[row][col].style, CellStyle::Accent);
        let label: String = frame.cells[row][col..col + 4].iter().map(|c| c.ch).collect();
        assert_eq!(label, "[13]");
    }

    #[test]
    fn wind_and_trend_formatting() {
        let mut station = Station::new("KAAA", 41.0, -74.0, StationKind::Land);
        station.history.append(
            HistoryRecord {
                timestamp: NOW - Duration::hours(3),
                temperature_c: Some(15.0),
                dewpoint_c: None,
                wind_dir_deg: None,
                wind_speed_mps: None,
                relative_humidity_pct: None,
                pressure_pa: None,
                visibility_m: None,
                precip_last_hour_m: None,
            },
            NOW,
        );
        station.history.append(
            HistoryRecord {
                timestamp: NOW - Duration::minutes(10),
                temperature_c: Some(20.0),
                dewpoint_c: None,
                wind_dir_deg: Some(275.0),
                wind_speed_mps: None,
                relative_humidity_pct: None,
                pressure_pa: None,
                visibility_m: None,
                precip_last_hour_m: None,
            },
            NOW,
        );

        assert_eq!(
            format_value(&station, DisplayMode::WindDirection, true, NOW),
            "W"
        );
        // +5 °C over ~3 h renders as +9 °F
        assert_eq!(format_value(&station, DisplayMode::Trend(3), true, NOW), "+9");
        // No wind speed on record inside the lookback
        assert_eq!(format_value(&station, DisplayMode::WindSpeed, true, NOW), "?");
    }

    #[test]
    fn pressure_shows_inhg_hundredths() {
        let mut station = Station::new("KAAA", 41.0, -74.0, StationKind::Land);
        station.history.append(
            HistoryRecord {
                timestamp: NOW - Duration::minutes(10),
                temperature_c: None,
                dewpoint_c: None,
                wind_dir_deg: None,
                wind_speed_mps: None,
                relative_humidity_pct: None,
                pressure_pa: Some(units::inhg_to_pascals(29.92)),
                visibility_m: None,
                precip_last_hour_m: None,
            },
            NOW,
        );
        assert_eq!(format_value(&station, DisplayMode::Pressure, true, NOW), "92");
    }
}
