//! Wire timestamp parsing.
//!
//! The backend stamps frames either with epoch milliseconds or with an
//! ISO-8601 string. Python's `datetime.isoformat()` omits the offset and
//! writes host-local time, so naive strings are read in the local timezone.
//! A local time that is skipped or repeated by a DST change is read as UTC.

use crate::error::{CoreError, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Naive ISO-8601 layout, fractional seconds optional.
const NAIVE_ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse a wire timestamp (epoch ms number, RFC 3339 or naive ISO-8601 string).
pub fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let millis = n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.floor() as i64))
                .ok_or_else(|| CoreError::InvalidTimestamp(n.to_string()))?;
            DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| CoreError::InvalidTimestamp(n.to_string()))
        }
        Value::String(s) => parse_iso(s),
        other => Err(CoreError::InvalidTimestamp(other.to_string())),
    }
}

fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, NAIVE_ISO_FORMAT)
        .map(local_to_utc)
        .map_err(|_| CoreError::InvalidTimestamp(s.to_string()))
}

fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// Parse an optional wire timestamp, falling back when absent or malformed.
pub fn timestamp_or(value: Option<&Value>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    value
        .and_then(|v| parse_timestamp(v).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;

    #[test]
    fn test_epoch_millis() {
        let ts = parse_timestamp(&json!(1000)).unwrap();
        assert_eq!(ts.timestamp_millis(), 1000);
    }

    #[test]
    fn test_epoch_millis_float() {
        let ts = parse_timestamp(&json!(1500.7)).unwrap();
        assert_eq!(ts.timestamp_millis(), 1500);
    }

    #[test]
    fn test_rfc3339_with_offset() {
        let ts = parse_timestamp(&json!("2024-03-01T12:00:00+02:00")).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_naive_iso_read_as_local_time() {
        let noon = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_milli_opt(12, 0, 0, 250)
            .unwrap();
        let ts = parse_timestamp(&json!("2024-03-01T12:00:00.250000")).unwrap();
        assert_eq!(ts.with_timezone(&Local).naive_local(), noon);

        let no_fraction = parse_timestamp(&json!("2024-03-01T12:00:00")).unwrap();
        assert_eq!(
            no_fraction.with_timezone(&Local).naive_local(),
            noon.with_nanosecond(0).unwrap()
        );
    }

    #[test]
    fn test_offset_string_ignores_local_timezone() {
        let with_z = parse_timestamp(&json!("2024-03-01T12:00:00Z")).unwrap();
        assert_eq!(with_z, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_timestamp(&json!("yesterday")).is_err());
        assert!(parse_timestamp(&json!(true)).is_err());
        assert!(parse_timestamp(&json!(null)).is_err());
    }

    #[test]
    fn test_timestamp_or_fallback() {
        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(timestamp_or(None, fallback), fallback);
        assert_eq!(timestamp_or(Some(&json!("bogus")), fallback), fallback);
        assert_eq!(
            timestamp_or(Some(&json!(2000)), fallback).timestamp_millis(),
            2000
        );
    }
}
