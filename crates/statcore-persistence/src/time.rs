use chrono::{DateTime, TimeZone, Utc};

/// Converts to the Unix-millisecond representation stored in every timestamp
/// column (§6).
pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Inverse of [`to_millis`]. Panics on an out-of-range value, which would
/// indicate corrupted storage rather than a recoverable error.
pub(crate) fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .expect("stored timestamp out of range")
}
