//! Timestamp utilities
//!
//! Export tables carry timestamps as text, usually in the form
//! `2025-10-14 12:52:21 UTC`. Everything here works in UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Chart labels for the twelve calendar months, January first
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Naive layouts tried after RFC 3339, interpreted as UTC
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S UTC",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a timestamp as written in export tables
///
/// Returns `None` for empty or unrecognised text. Callers treat that as
/// "no timestamp", never as an error.
pub fn parse_export_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Zero-based month index (0 = January) of a timestamp
pub fn month_index(timestamp: &DateTime<Utc>) -> usize {
    timestamp.month0() as usize
}

/// Closed time interval `[start, end]`, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting `start > end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "Time window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar year: `YYYY-01-01T00:00:00Z ..= YYYY-12-31T23:59:59Z`
    pub fn calendar_year(year: i32) -> Result<Self> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .ok_or_else(|| Error::InvalidInput(format!("Invalid year: {}", year)))?;
        let end = Utc
            .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
            .single()
            .ok_or_else(|| Error::InvalidInput(format!("Invalid year: {}", year)))?;
        Self::new(start, end)
    }

    /// Build a window from two textual timestamps (any format accepted by
    /// [`parse_export_timestamp`])
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start_ts = parse_export_timestamp(start)
            .ok_or_else(|| Error::InvalidInput(format!("Unparseable window start: {:?}", start)))?;
        let end_ts = parse_export_timestamp(end)
            .ok_or_else(|| Error::InvalidInput(format!("Unparseable window end: {:?}", end)))?;
        Self::new(start_ts, end_ts)
    }

    /// True when `timestamp` lies within the window, bounds included
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        *timestamp >= self.start && *timestamp <= self.end
    }
}
