//! Timestamp utilities
//!
//! Spreadsheet timestamps arrive as strings in whatever format the form
//! tool wrote them. RFC 3339 strings carry their own offset; everything else
//! is treated as wall-clock time in the sheet's configured UTC offset.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// Wall-clock formats accepted after RFC 3339 fails
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Earliest possible high-water mark (Unix epoch)
pub fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Build the sheet's fixed UTC offset from minutes east of UTC
pub fn offset_from_minutes(minutes: i32) -> Result<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| Error::Config(format!("UTC offset out of range: {} minutes", minutes)))
}

/// Parse a spreadsheet timestamp into a UTC instant
///
/// Empty or whitespace-only input is rejected like any other unparseable value.
/// The result is truncated to whole milliseconds, the precision the store
/// keeps, so a re-read row compares equal to its stored copy.
pub fn parse_sheet_timestamp(raw: &str, sheet_offset: FixedOffset) -> Result<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("empty timestamp".to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(3));
    }

    let naive = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| Error::InvalidInput(format!("unrecognized timestamp: {}", trimmed)))?;

    naive
        .and_local_timezone(sheet_offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
        .ok_or_else(|| Error::InvalidInput(format!("ambiguous timestamp: {}", trimmed)))
}

/// Convert an instant to Unix milliseconds for storage
pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Convert stored Unix milliseconds back to an instant
pub fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| Error::InvalidInput(format!("timestamp out of range: {} ms", millis)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        offset_from_minutes(0).unwrap()
    }

    #[test]
    fn test_parse_rfc3339() {
        let ts = parse_sheet_timestamp("2024-01-02T00:00:00Z", utc()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_keeps_its_own_offset() {
        let ts = parse_sheet_timestamp("2024-01-02T02:00:00+02:00", offset_from_minutes(-300).unwrap()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_google_forms_format() {
        let ts = parse_sheet_timestamp("1/15/2024 9:05:30", utc()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 30).unwrap());
    }

    #[test]
    fn test_parse_applies_sheet_offset() {
        // 10:00 at UTC+2 is 08:00 UTC
        let offset = offset_from_minutes(120).unwrap();
        let ts = parse_sheet_timestamp("2024-03-01 10:00:00", offset).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_date_only_is_midnight() {
        let ts = parse_sheet_timestamp("2024-03-01", utc()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(parse_sheet_timestamp("", utc()).is_err());
        assert!(parse_sheet_timestamp("   ", utc()).is_err());
        assert!(parse_sheet_timestamp("yesterday-ish", utc()).is_err());
        assert!(parse_sheet_timestamp("13/45/2024 10:00:00", utc()).is_err());
    }

    #[test]
    fn test_parse_truncates_to_millis() {
        let ts = parse_sheet_timestamp("2024-01-02T00:00:00.000500Z", utc()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(from_millis(to_millis(ts)).unwrap(), ts);

        let ts = parse_sheet_timestamp("2024-01-02 00:00:00.123999", utc()).unwrap();
        assert_eq!(to_millis(ts) % 1000, 123);
        assert_eq!(from_millis(to_millis(ts)).unwrap(), ts);
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(offset_from_minutes(24 * 60).is_err());
        assert!(offset_from_minutes(i32::MAX).is_err());
        assert!(offset_from_minutes(i32::MIN).is_err());
    }

    #[test]
    fn test_millis_conversion() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(from_millis(to_millis(ts)).unwrap(), ts);
        assert_eq!(to_millis(epoch()), 0);
    }
}
