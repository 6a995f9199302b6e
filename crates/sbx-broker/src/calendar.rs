//! Trading calendar helpers.
//!
//! Deterministic, pure logic. No IO, no wall-clock, no randomness. Business
//! days are Monday through Friday; venue holidays are out of scope for the
//! simulation.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};

/// `true` for Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Add `n` business days to `from`, preserving the time of day.
///
/// `n = 0` returns `from` unchanged. Used for T+N settlement dates.
pub fn add_business_days(from: DateTime<Utc>, n: u32) -> DateTime<Utc> {
    let time = from.time();
    let mut date = from.date_naive();
    let mut remaining = n;
    while remaining > 0 {
        date = date.succ_opt().expect("date out of range");
        if !is_weekend(date) {
            remaining -= 1;
        }
    }
    DateTime::from_naive_utc_and_offset(date.and_time(time), Utc)
}

/// Market-hours gate: weekday and inside `[open, close]` inclusive.
pub fn is_market_open(
    local: NaiveDateTime,
    open_hour: u32,
    open_minute: u32,
    close_hour: u32,
    close_minute: u32,
) -> bool {
    if is_weekend(local.date()) {
        return false;
    }
    let minute_of_day = local.hour() * 60 + local.minute();
    minute_of_day >= open_hour * 60 + open_minute && minute_of_day <= close_hour * 60 + close_minute
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
