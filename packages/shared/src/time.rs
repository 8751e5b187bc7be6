//! Time-related utilities with clock abstraction for testability.
//!
//! Timestamps travel on the wire as ISO-8601 strings in UTC with millisecond
//! precision (`2023-01-01T00:00:00.000Z`). Internally they are Unix
//! milliseconds.

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get current Unix timestamp (milliseconds)
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Get current Unix timestamp (milliseconds)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to an ISO-8601 UTC string.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn millis_to_iso8601(timestamp_millis: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 string into Unix milliseconds.
pub fn iso8601_to_millis(value: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Render an ISO-8601 timestamp in JST for display.
///
/// Strings that do not parse are returned unchanged.
pub fn iso8601_to_jst_display(value: &str) -> String {
    let Some(jst_offset) = FixedOffset::east_opt(9 * 3600) else {
        return value.to_string();
    };
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt
            .with_timezone(&jst_offset)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        Err(_) => value.to_string(),
    }
}
