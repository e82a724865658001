//! NBM cycle arithmetic
//!
//! The text blend products publish four times a day at 01/07/13/19 UTC.

use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// Newest cycle at or before `now`. Before 01Z that is yesterday's 19Z.
/// The text blends publish at 01, 07, 13 and 19 UTC.
pub fn target_cycle(now: OffsetDateTime) -> (Date, u8) {
    let hour = now.hour();
    if hour >= 1 {
        let target = if hour >= 19 {
            19
        } else if hour >= 13 {
            13
        } else if hour >= 7 {
            7
        } else {
            1
        };
        (now.date(), target)
    } else {
        (now.date().previous_day().unwrap_or(now.date()), 19)
    }
}

/// One publication step back (6 hours)
pub fn previous_cycle(date: Date, cycle: u8) -> (Date, u8) {
    if cycle >= 6 {
        (date, cycle - 6)
    } else {
        (date.previous_day().unwrap_or(date), cycle + 18)
    }
}

/// The cycle's run time as an instant
pub fn cycle_datetime(date: Date, cycle: u8) -> Option<OffsetDateTime> {
    let time = Time::from_hms(cycle, 0, 0).ok()?;
    Some(PrimitiveDateTime::new(date, time).assume_utc())
}
