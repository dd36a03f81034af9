//! Date/time utilities for PinPin.

use chrono::{DateTime, NaiveDateTime, Utc};

/// SQLite `datetime('now')` layout.
const DB_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a database datetime string (YYYY-MM-DD HH:MM:SS) to RFC3339 format.
///
/// The database stores times in UTC, so 'Z' is appended. Strings that are
/// already RFC3339 are returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    if DateTime::parse_from_rfc3339(datetime_str).is_ok() {
        return datetime_str.to_string();
    }
    format!("{}Z", datetime_str.replace(' ', "T"))
}

/// Parse a database datetime string into a UTC timestamp.
pub fn parse_db_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(datetime_str, DB_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Format a timestamp in the database layout.
pub fn to_db_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DB_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_rfc3339() {
        assert_eq!(to_rfc3339("2024-01-15 10:30:00"), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_to_rfc3339_passthrough() {
        assert_eq!(to_rfc3339("2024-01-15T10:30:00Z"), "2024-01-15T10:30:00Z");
    }

    #[test]
    fn test_parse_db_datetime() {
        let dt = parse_db_datetime("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
        assert!(parse_db_datetime("not a date").is_none());
    }

    #[test]
    fn test_db_datetime_round_trip() {
        let dt = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(to_db_datetime(&dt), "2024-12-31 23:59:59");
        assert_eq!(parse_db_datetime(&to_db_datetime(&dt)), Some(dt));
    }
}
