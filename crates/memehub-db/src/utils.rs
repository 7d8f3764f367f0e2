//! Shared utility functions

use chrono::{DateTime, Utc};

/// Parse a datetime string (RFC3339 format) or return current time
///
/// Used by the row conversions, where a malformed timestamp should not make
/// the whole user record unreadable.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Convert a stored unix timestamp (seconds) back into a UTC datetime
pub fn datetime_from_unix(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
}

/// Whether a database URL points at a private in-memory SQLite database
///
/// Every pooled connection to such a URL gets its own empty database, so the
/// pool has to be pinned to a single long-lived connection.
pub fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
