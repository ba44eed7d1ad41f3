//! Date handling shared by the stores, the report engine and the CLI.
//!
//! Dates are persisted as `TEXT` in `YYYY-MM-DD HH:MM:SS` form so that SQLite's string
//! comparison orders them chronologically.

use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// The storage format for dates.
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats `date` for storage and for comparison in SQL.
pub(crate) fn to_sql(date: NaiveDateTime) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats `date` for people: just the day when the time is midnight.
pub(crate) fn to_display(date: NaiveDateTime) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        to_sql(date)
    }
}

/// Reads a stored date. Accepts a bare `YYYY-MM-DD` as midnight, and tolerates fractional
/// seconds.
pub(crate) fn from_sql(s: &str) -> Result<NaiveDateTime> {
    parse_date(s).with_context(|| format!("Invalid date stored in database '{s}'"))
}

/// Parses a user or database supplied date, either `YYYY-MM-DD` (midnight) or
/// `YYYY-MM-DD HH:MM:SS` with an optional `T` separator and fractional seconds.
pub fn parse_date(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(date);
        }
    }
    bail!("Unable to parse '{s}' as a date, expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS")
}

/// The `YYYY/MM` key used to label monthly groups.
pub fn month_key(date: NaiveDateTime) -> String {
    format!("{:04}/{:02}", date.year(), date.month())
}

/// Midnight on the first day of the month containing `date`.
pub(crate) fn month_start(date: NaiveDateTime) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date.date())
        .and_time(NaiveTime::MIN)
}

/// Midnight on the first day of the month after the one containing `date`.
pub(crate) fn next_month_start(date: NaiveDateTime) -> NaiveDateTime {
    let start = month_start(date);
    let (year, month) = if start.month() == 12 {
        (start.year() + 1, 1)
    } else {
        (start.year(), start.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.and_time(NaiveTime::MIN))
        // Only reachable at the very end of chrono's range.
        .unwrap_or_else(|| start + Duration::days(31))
}
