//! NBM text product handling
//!
//! Fetch target: the fixed-width `blend_nbptx` text product. One station's
//! block is cut out of the national file, then the daily-high (TX)
//! percentile rows are matched to forecast-hour columns by character
//! position — the format has no delimiters, alignment is the contract.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use time::{Date, Duration, OffsetDateTime};

static FHR_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{2,3}").unwrap());
static ROW_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?\d{1,3}").unwrap());
static STATION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[A-Z0-9]{3,6}\s+NBM").unwrap());

/// A value is matched to a column when their centers are this close
const COLUMN_TOLERANCE: f64 = 4.0;

pub fn format_yyyymmdd(date: Date) -> String {
    format!(
        "{:04}{:02}{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

pub fn product_url(base: &str, date: Date, cycle: u8) -> String {
    format!(
        "{}/blend.{}/{:02}/text/blend_nbptx.t{:02}z",
        base,
        format_yyyymmdd(date),
        cycle,
        cycle
    )
}

/// The upstream directory serves HTML error pages with status 200 and
/// truncated stubs during publication; neither counts as published.
pub fn looks_published(body: &str) -> bool {
    !body.contains("<!DOCTYPE html>") && !body.contains("404 Not Found") && body.len() >= 1000
}

/// Cut one station's guidance block out of the national product
pub fn extract_station_block(text: &str, station: &str) -> Option<String> {
    let start = Regex::new(&format!(r"^\s*{}\s+NBM", regex::escape(station))).ok()?;

    let mut buffer: Vec<&str> = Vec::new();
    let mut capturing = false;
    for line in text.lines() {
        if !capturing {
            if start.is_match(line) {
                capturing = true;
                buffer.push(line);
            }
        } else {
            if STATION_HEADER.is_match(line) && !start.is_match(line) {
                break;
            }
            buffer.push(line);
        }
    }

    if buffer.is_empty() {
        None
    } else {
        Some(buffer.join("\n"))
    }
}

/// One 18-hour daily-high window with its probability spread
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityWindow {
    /// 00Z valid hour the column is dated to
    pub valid: OffsetDateTime,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub p10: Option<i32>,
    pub p20: Option<i32>,
    pub p50: i32,
    pub p70: Option<i32>,
    pub p90: Option<i32>,
}

impl ProbabilityWindow {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    pub fn is_future(&self, now: OffsetDateTime) -> bool {
        now < self.start
    }
}

struct Column {
    center: f64,
    valid: OffsetDateTime,
}

/// Parse the TXNP percentile rows of a station block. The FHR row dates
/// the columns; only columns valid at 00Z become windows, each spanning
/// valid − 12 h to valid + 6 h. Rows without a 50th percentile are
/// dropped.
pub fn parse_daily_high(matrix: &str, cycle_start: OffsetDateTime) -> Vec<ProbabilityWindow> {
    let lines: Vec<&str> = matrix.lines().collect();
    let Some(fhr_line) = lines
        .iter()
        .find(|line| line.trim_start().starts_with("FHR"))
    else {
        return Vec::new();
    };

    let mut columns: Vec<Column> = Vec::new();
    for m in FHR_VALUE.find_iter(fhr_line) {
        let Ok(fhr) = m.as_str().parse::<i64>() else {
            continue;
        };
        let valid = cycle_start + Duration::hours(fhr);
        if valid.hour() == 0 {
            columns.push(Column {
                center: (m.start() + m.end()) as f64 / 2.0,
                valid,
            });
        }
    }

    const PERCENTILE_ROWS: [(&str, usize); 5] = [
        ("TXNP1", 0),
        ("TXNP2", 1),
        ("TXNP5", 2),
        ("TXNP7", 3),
        ("TXNP9", 4),
    ];
    let mut by_valid: BTreeMap<OffsetDateTime, [Option<i32>; 5]> = BTreeMap::new();
    for line in &lines {
        let trimmed = line.trim_start();
        let Some((_, slot)) = PERCENTILE_ROWS
            .iter()
            .find(|(prefix, _)| trimmed.starts_with(prefix))
        else {
            continue;
        };
        for m in ROW_VALUE.find_iter(line) {
            let Ok(value) = m.as_str().parse::<i32>() else {
                continue;
            };
            let center = (m.start() + m.end()) as f64 / 2.0;
            if let Some(column) = columns
                .iter()
                .find(|c| (center - c.center).abs() < COLUMN_TOLERANCE)
            {
                by_valid.entry(column.valid).or_default()[*slot] = Some(value);
            }
        }
    }

    by_valid
        .into_iter()
        .filter_map(|(valid, percentiles)| {
            let p50 = percentiles[2]?;
            Some(ProbabilityWindow {
                valid,
                start: valid - Duration::hours(12),
                end: valid + Duration::hours(6),
                p10: percentiles[0],
                p20: percentiles[1],
                p50,
                p70: percentiles[3],
                p90: percentiles[4],
            })
        })
        .collect()
}
