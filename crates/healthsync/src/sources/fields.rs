//! Field coercion shared by the source parsers
//!
//! Every function returns `None` instead of an error: an unparseable field is
//! treated as absent, never as zero.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a finite number, ignoring surrounding whitespace
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an optional cell as a number
pub fn parse_opt_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(parse_f64)
}

/// Parse an integral number; "3" and "3.0" are accepted, "W" and "2.5" are not
pub fn parse_whole(value: &str) -> Option<i64> {
    let number = parse_f64(value)?;
    if number.fract() != 0.0 {
        return None;
    }
    Some(number as i64)
}

/// Parse an export timestamp into local wall-clock time
///
/// Accepts `2024-06-01 10:00:00 -0700` (offset dropped, wall time kept),
/// RFC 3339, and offset-less forms.
pub fn parse_local_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_calendar_date(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// Parse a calendar day, tolerating a trailing time component
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let date_part = trimmed
        .split(|c| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Trimmed, non-empty text
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_f64_rejects_garbage() {
        assert_eq!(parse_f64(" 12.5 "), Some(12.5));
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("abc"), None);
        assert_eq!(parse_f64("NaN"), None);
    }

    #[test]
    fn test_parse_whole() {
        assert_eq!(parse_whole("3"), Some(3));
        assert_eq!(parse_whole("3.0"), Some(3));
        assert_eq!(parse_whole("2.5"), None);
        assert_eq!(parse_whole("W"), None);
    }

    #[test]
    fn test_parse_local_datetime_drops_offset() {
        let dt = parse_local_datetime("2024-06-01 23:30:00 -0700").unwrap();
        assert_eq!(dt.to_string(), "2024-06-01 23:30:00");
    }

    #[test]
    fn test_parse_local_datetime_naive_and_date_only() {
        assert_eq!(
            parse_local_datetime("2024-06-01 07:30:00").unwrap().to_string(),
            "2024-06-01 07:30:00"
        );
        assert_eq!(
            parse_local_datetime("2024-06-01").unwrap().to_string(),
            "2024-06-01 00:00:00"
        );
        assert!(parse_local_datetime("yesterday").is_none());
    }

    #[test]
    fn test_parse_calendar_date_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(parse_calendar_date("2024-06-01"), Some(expected));
        assert_eq!(parse_calendar_date("2024-06-01 00:00:00"), Some(expected));
        assert_eq!(parse_calendar_date("06/01/2024"), Some(expected));
        assert_eq!(parse_calendar_date("Date"), None);
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  Squat ")), Some("Squat".to_string()));
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(None), None);
    }
}
