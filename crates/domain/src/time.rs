//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for envelope times, `last_update`, history records.
///
/// Serialized by serde as an ISO-8601 / RFC 3339 string.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_serialize_as_iso8601() {
        let ts: Timestamp = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2025-01-15T10:30:00Z\"");
    }
}
