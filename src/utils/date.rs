use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Date format used on the command line and in the cache CSV.
pub const DEFAULT_DATEFORMAT: &str = "%d-%m-%Y";
/// Date format of the `startDate`/`endDate` query parameters.
pub const NBRB_API_DATEFORMAT: &str = "%Y-%m-%d";
/// Timestamp format of the `Date` field in API responses.
pub const ISO_8601_DATEFORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn format_day(date: NaiveDate) -> String {
    date.format(DEFAULT_DATEFORMAT).to_string()
}

pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DEFAULT_DATEFORMAT)
        .with_context(|| format!("Invalid date '{}', expected DD-MM-YYYY", s))
}

pub fn format_api_date(date: NaiveDate) -> String {
    date.format(NBRB_API_DATEFORMAT).to_string()
}

pub fn parse_api_datetime(s: &str) -> Result<NaiveDate> {
    NaiveDateTime::parse_from_str(s, ISO_8601_DATEFORMAT)
        .map(|dt| dt.date())
        .with_context(|| format!("Invalid API timestamp '{}'", s))
}

/// clap value parser for `DD-MM-YYYY` arguments.
pub fn valid_date(s: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DEFAULT_DATEFORMAT)
        .map_err(|_| format!("invalid date '{}', expected DD-MM-YYYY", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_day() {
        let date = parse_day("05-02-2021").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 2, 5).unwrap());
        assert_eq!(format_day(date), "05-02-2021");
        assert_eq!(format_api_date(date), "2021-02-05");
    }

    #[test]
    fn test_valid_date_rejects_malformed() {
        let invalid_cases = vec!["2021-02-05", "32-01-2021", "05/02/2021", "", "abc"];
        for input in invalid_cases {
            assert!(valid_date(input).is_err(), "Should fail for input: {}", input);
        }
    }

    #[test]
    fn test_parse_api_datetime() {
        let date = parse_api_datetime("2020-01-09T00:00:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2020, 1, 9).unwrap());
        assert!(parse_api_datetime("2020-01-09").is_err());
    }
}
