//! Per-station rolling observation history
//!
//! An append-only, timestamp-deduplicated series trimmed lazily to a
//! 24-hour trailing window. Written only by the polling side; the renderer
//! issues the lookback, trend and accumulation queries.

use std::collections::BTreeMap;

use time::{Duration, OffsetDateTime};

use crate::observation::NormalizedObservation;

/// Trailing retention window, pruned opportunistically on append
pub const RETENTION: Duration = Duration::hours(24);

/// A trend match farther than this from its target time is discarded
const TREND_TOLERANCE: Duration = Duration::minutes(30);

/// Numeric fields a history query can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Temperature,
    Dewpoint,
    WindDirection,
    WindSpeed,
    Humidity,
    Pressure,
    Visibility,
    Precipitation,
}

/// Frozen numeric snapshot of one accepted observation
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: OffsetDateTime,
    pub temperature_c: Option<f64>,
    pub dewpoint_c: Option<f64>,
    pub wind_dir_deg: Option<f64>,
    pub wind_speed_mps: Option<f64>,
    pub relative_humidity_pct: Option<f64>,
    pub pressure_pa: Option<f64>,
    pub visibility_m: Option<f64>,
    pub precip_last_hour_m: Option<f64>,
}

impl HistoryRecord {
    /// `None` when the observation has no usable timestamp; such results
    /// update the latest reading but never enter history.
    pub fn from_observation(obs: &NormalizedObservation) -> Option<HistoryRecord> {
        Some(HistoryRecord {
            timestamp: obs.timestamp?,
            temperature_c: obs.temperature_c,
            dewpoint_c: obs.dewpoint_c,
            wind_dir_deg: obs.wind_dir_deg,
            wind_speed_mps: obs.wind_speed_mps,
            relative_humidity_pct: obs.relative_humidity_pct,
            pressure_pa: obs.pressure_pa,
            visibility_m: obs.visibility_m,
            precip_last_hour_m: obs.precip_last_hour_m,
        })
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Temperature => self.temperature_c,
            Field::Dewpoint => self.dewpoint_c,
            Field::WindDirection => self.wind_dir_deg,
            Field::WindSpeed => self.wind_speed_mps,
            Field::Humidity => self.relative_humidity_pct,
            Field::Pressure => self.pressure_pa,
            Field::Visibility => self.visibility_m,
            Field::Precipitation => self.precip_last_hour_m,
        }
    }
}

/// Signed temperature change versus a past reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// Anchor minus matched value, °C
    Delta(f64),
    /// No temperature reading exists at all
    NoAnchor,
    /// No reading lands close enough to the target time
    NoMatch,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<HistoryRecord>,
}

impl History {
    /// Append a record, keeping timestamps strictly increasing (a re-served
    /// reading with an already-seen timestamp is dropped) and trimming
    /// records that have aged out of the retention window.
    pub fn append(&mut self, record: HistoryRecord, now: OffsetDateTime) {
        if let Some(last) = self.records.last() {
            if record.timestamp <= last.timestamp {
                return;
            }
        }
        self.records.push(record);

        let cutoff = now - RETENTION;
        if self
            .records
            .first()
            .is_some_and(|first| first.timestamp < cutoff)
        {
            self.records.retain(|r| r.timestamp > cutoff);
        }
    }

    /// Most recent non-null value of `field` no older than `max_age`.
    /// Records inside the window with a null field are skipped; the scan
    /// stops at the first record past the age boundary.
    pub fn latest_within(
        &self,
        field: Field,
        max_age: Duration,
        now: OffsetDateTime,
    ) -> Option<f64> {
        let cutoff = now - max_age;
        for record in self.records.iter().rev() {
            if record.timestamp < cutoff {
                break;
            }
            if let Some(value) = record.get(field) {
                return Some(value);
            }
        }
        None
    }

    /// Temperature change over roughly `hours_back` hours: anchor at the
    /// most recent temperature reading, match the record nearest to
    /// anchor − hours_back, reject matches farther than 30 minutes out.
    pub fn trend(&self, hours_back: i64) -> Trend {
        let anchor = self
            .records
            .iter()
            .rev()
            .find_map(|r| r.temperature_c.map(|v| (r.timestamp, v)));
        let Some((anchor_ts, anchor_val)) = anchor else {
            return Trend::NoAnchor;
        };

        let target = anchor_ts - Duration::hours(hours_back);
        let mut best: Option<f64> = None;
        let mut best_diff = Duration::hours(1);
        for record in &self.records {
            let Some(value) = record.temperature_c else {
                continue;
            };
            let diff = (record.timestamp - target).abs();
            if diff < best_diff {
                best_diff = diff;
                best = Some(value);
            }
        }

        match best {
            Some(matched) if best_diff <= TREND_TOLERANCE => Trend::Delta(anchor_val - matched),
            _ => Trend::NoMatch,
        }
    }

    /// Precipitation accumulated over `(latest − hours_back, latest]`.
    /// Providers re-serve overlapping hourly totals, so each UTC-hour
    /// bucket keeps its maximum and the buckets are summed. `None` when no
    /// record in the window carries the field at all — distinct from a
    /// true zero accumulation.
    pub fn accumulation(&self, hours_back: i64) -> Option<f64> {
        let end = self.records.last()?.timestamp;
        let start = end - Duration::hours(hours_back);

        let mut hourly_max: BTreeMap<i64, f64> = BTreeMap::new();
        for record in &self.records {
            if record.timestamp <= start || record.timestamp > end {
                continue;
            }
            let Some(p) = record.precip_last_hour_m else {
                continue;
            };
            let bucket = record.timestamp.unix_timestamp().div_euclid(3600);
            let entry = hourly_max.entry(bucket).or_insert(p);
            if p > *entry {
                *entry = p;
            }
        }

        if hourly_max.is_empty() {
            return None;
        }
        Some(hourly_max.values().sum())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn record(ts: OffsetDateTime) -> HistoryRecord {
        HistoryRecord {
            timestamp: ts,
            temperature_c: None,
            dewpoint_c: None,
            wind_dir_deg: None,
            wind_speed_mps: None,
            relative_humidity_pct: None,
            pressure_pa: None,
            visibility_m: None,
            precip_last_hour_m: None,
        }
    }

    fn temp_record(ts: OffsetDateTime, temp: f64) -> HistoryRecord {
        HistoryRecord {
            temperature_c: Some(temp),
            ..record(ts)
        }
    }

    fn precip_record(ts: OffsetDateTime, precip: f64) -> HistoryRecord {
        HistoryRecord {
            precip_last_hour_m: Some(precip),
            ..record(ts)
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

    #[test]
    fn append_keeps_timestamps_strictly_increasing() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 10:00 UTC), 10.0), NOW);
        history.append(temp_record(datetime!(2025-06-01 10:00 UTC), 11.0), NOW);
        history.append(temp_record(datetime!(2025-06-01 09:00 UTC), 9.0), NOW);
        history.append(temp_record(datetime!(2025-06-01 11:00 UTC), 12.0), NOW);

        let stamps: Vec<_> = history.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                datetime!(2025-06-01 10:00 UTC),
                datetime!(2025-06-01 11:00 UTC)
            ]
        );
        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn append_prunes_lazily_past_retention() {
        let mut history = History::default();
        let yesterday = datetime!(2025-05-31 14:00 UTC);
        history.append(temp_record(datetime!(2025-05-31 06:00 UTC), 5.0), yesterday);
        history.append(temp_record(datetime!(2025-05-31 13:00 UTC), 6.0), yesterday);
        // Nothing has aged out yet relative to the append-time clock
        assert_eq!(history.len(), 2);

        // The next append notices the window slipped and trims the tail
        history.append(temp_record(datetime!(2025-06-01 11:30 UTC), 14.0), NOW);
        let stamps: Vec<_> = history.records().iter().map(|r| r.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                datetime!(2025-05-31 13:00 UTC),
                datetime!(2025-06-01 11:30 UTC)
            ]
        );
    }

    #[test]
    fn lookback_respects_age_window() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 11:39 UTC), 18.0), NOW);
        let max_age = Duration::minutes(20);

        // 21 minutes old: outside the window
        assert_eq!(
            history.latest_within(Field::Temperature, max_age, datetime!(2025-06-01 12:00 UTC)),
            None
        );
        // 19 minutes old: inside
        assert_eq!(
            history.latest_within(Field::Temperature, max_age, datetime!(2025-06-01 11:58 UTC)),
            Some(18.0)
        );
    }

    #[test]
    fn lookback_skips_null_fields_inside_window() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 11:00 UTC), 17.0), NOW);
        history.append(record(datetime!(2025-06-01 11:30 UTC)), NOW);
        history.append(record(datetime!(2025-06-01 11:45 UTC)), NOW);

        assert_eq!(
            history.latest_within(Field::Temperature, Duration::minutes(90), NOW),
            Some(17.0)
        );
        // Every record with the field inside a tighter window is null
        assert_eq!(
            history.latest_within(Field::Temperature, Duration::minutes(40), NOW),
            None
        );
    }

    #[test]
    fn trend_matches_nearest_record_within_tolerance() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 08:50 UTC), 10.0), NOW);
        history.append(temp_record(datetime!(2025-06-01 11:55 UTC), 14.5), NOW);

        // Target 08:55, match at 08:50 (5 min off)
        assert_eq!(history.trend(3), Trend::Delta(4.5));
    }

    #[test]
    fn trend_rejects_match_past_tolerance() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 08:00 UTC), 10.0), NOW);
        history.append(temp_record(datetime!(2025-06-01 11:55 UTC), 14.5), NOW);

        // Target 10:55, nearest temperature is 55 minutes away (the anchor
        // itself is 60 minutes away)
        assert_eq!(history.trend(1), Trend::NoMatch);
    }

    #[test]
    fn trend_without_any_temperature_is_unanchored() {
        let mut history = History::default();
        history.append(record(datetime!(2025-06-01 11:00 UTC)), NOW);
        assert_eq!(history.trend(1), Trend::NoAnchor);
        assert_eq!(History::default().trend(1), Trend::NoAnchor);
    }

    #[test]
    fn accumulation_dedupes_within_hour_buckets() {
        let mut history = History::default();
        history.append(precip_record(datetime!(2025-06-01 11:10 UTC), 0.002), NOW);
        history.append(precip_record(datetime!(2025-06-01 11:40 UTC), 0.003), NOW);

        // Overlapping reports inside one hour: max, not sum
        assert_eq!(history.accumulation(3), Some(0.003));
    }

    #[test]
    fn accumulation_sums_across_hours() {
        let mut history = History::default();
        history.append(precip_record(datetime!(2025-06-01 09:30 UTC), 0.001), NOW);
        history.append(precip_record(datetime!(2025-06-01 10:30 UTC), 0.004), NOW);
        history.append(precip_record(datetime!(2025-06-01 11:30 UTC), 0.002), NOW);

        assert_eq!(history.accumulation(6), Some(0.007));
    }

    #[test]
    fn accumulation_unknown_when_field_absent() {
        let mut history = History::default();
        history.append(temp_record(datetime!(2025-06-01 11:00 UTC), 15.0), NOW);

        // Records exist but none carry precipitation
        assert_eq!(history.accumulation(6), None);
        assert_eq!(History::default().accumulation(6), None);
    }

    #[test]
    fn accumulation_window_excludes_older_records() {
        let mut history = History::default();
        history.append(precip_record(datetime!(2025-06-01 08:00 UTC), 0.010), NOW);
        history.append(precip_record(datetime!(2025-06-01 11:30 UTC), 0.002), NOW);

        // 1-hour window anchored at the latest record
        assert_eq!(history.accumulation(1), Some(0.002));
    }
}
