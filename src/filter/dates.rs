use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unrecognized date/time: {0}")]
pub struct DateParseError(pub String);

/// Formats carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Formats without an offset; read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y%m%dT%H%M%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d"];

/// Parse the ISO-8601-like timestamps found in catalogs and normalize them to UTC.
///
/// A trailing `Z`, `UTC` or `GMT` designator is accepted; values without any offset are
/// taken to be UTC. Date-only values resolve to midnight.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = strip_utc_designator(text);
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(naive, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

fn strip_utc_designator(text: &str) -> &str {
    ["Z", " UTC", "UTC", " GMT", "GMT"]
        .iter()
        .find_map(|suffix| text.strip_suffix(suffix))
        .map_or(text, str::trim_end)
}

/// Test a dataset's raw modified date against optional bounds.
///
/// A missing date always passes. A present date is always parsed, bounds or not.
/// `after` excludes strictly earlier timestamps and `before` excludes strictly later ones.
///
/// # Errors
///
/// Returns `DateParseError` if the date is present but cannot be parsed; callers
/// exclude the dataset rather than failing the crawl.
pub fn passes_date_filter(
    raw: Option<&str>,
    before: Option<DateTime<Utc>>,
    after: Option<DateTime<Utc>>,
) -> Result<bool, DateParseError> {
    let Some(raw) = raw else {
        return Ok(true);
    };

    let timestamp = parse_timestamp(raw).ok_or_else(|| DateParseError(raw.to_string()))?;
    if after.is_some_and(|after| timestamp < after) {
        return Ok(false);
    }
    if before.is_some_and(|before| timestamp > before) {
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_common_catalog_formats() {
        let expected = utc(2015, 12, 30, 12, 30, 0);
        for raw in [
            "2015-12-30T12:30:00Z",
            "2015-12-30T12:30:00.000Z",
            "2015-12-30T14:30:00+02:00",
            "2015-12-30 12:30:00Z",
            "2015-12-30 12:30:00",
            "2015-12-30T12:30:00",
            "2015-12-30T12:30Z",
            "2015-12-30 12:30:00 UTC",
            "  2015-12-30T12:30:00Z  ",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_timestamp("2016-01-08"), Some(utc(2016, 1, 8, 0, 0, 0)));
        assert_eq!(parse_timestamp("20160108"), Some(utc(2016, 1, 8, 0, 0, 0)));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("last tuesday"), None);
        assert_eq!(parse_timestamp("2016-13-45"), None);
    }

    #[test]
    fn test_missing_date_always_passes() {
        let bound = Some(utc(2016, 1, 1, 0, 0, 0));
        assert_eq!(passes_date_filter(None, bound, bound), Ok(true));
    }

    #[test]
    fn test_after_bound() {
        let after = Some(utc(2015, 12, 30, 0, 0, 0));
        assert_eq!(passes_date_filter(Some("2015-12-29T23:59:59Z"), None, after), Ok(false));
        assert_eq!(passes_date_filter(Some("2015-12-30T00:00:00Z"), None, after), Ok(true));
        assert_eq!(passes_date_filter(Some("2016-01-01"), None, after), Ok(true));
    }

    #[test]
    fn test_before_bound() {
        let before = Some(utc(2016, 1, 8, 0, 0, 0));
        assert_eq!(passes_date_filter(Some("2016-01-08T00:00:01Z"), before, None), Ok(false));
        assert_eq!(passes_date_filter(Some("2016-01-08"), before, None), Ok(true));
    }

    #[test]
    fn test_both_bounds() {
        let after = Some(utc(2016, 1, 20, 0, 0, 0));
        let before = Some(utc(2016, 2, 1, 0, 0, 0));
        assert_eq!(passes_date_filter(Some("2016-01-25"), before, after), Ok(true));
        assert_eq!(passes_date_filter(Some("2016-01-19"), before, after), Ok(false));
        assert_eq!(passes_date_filter(Some("2016-02-02"), before, after), Ok(false));
    }

    #[test]
    fn test_unparseable_date_is_an_error_even_without_bounds() {
        assert_eq!(
            passes_date_filter(Some("soon"), None, None),
            Err(DateParseError("soon".to_string()))
        );
        assert_eq!(passes_date_filter(Some("2016-01-25"), None, None), Ok(true));
        assert_eq!(
            passes_date_filter(Some("soon"), None, Some(utc(2016, 1, 1, 0, 0, 0))),
            Err(DateParseError("soon".to_string()))
        );
    }
}
