//! Timestamp encoding shared by every table.
//!
//! Timestamps are stored as RFC 3339 text with microsecond precision so that
//! lexical order matches creation order.

use chrono::{DateTime, SecondsFormat, Utc};

/// The current time in storage format.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp. Returns a description of the bad value on failure.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Failed to parse date '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps_sort_in_creation_order() {
        let first = now_timestamp();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = now_timestamp();
        assert!(first < second);
        assert!(parse_timestamp(&first).unwrap() < parse_timestamp(&second).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("2024-13-45").is_err());
    }
}
