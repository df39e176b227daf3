//! Timestamp utilities

use chrono::{DateTime, TimeZone, Utc};

/// Convert a timestamp to Unix milliseconds (storage representation)
pub fn to_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Convert Unix milliseconds back to a timestamp
///
/// Returns None for values outside chrono's representable range.
pub fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
