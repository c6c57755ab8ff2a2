//! Typed value parsing for string cells
//!
//! Source files are loosely typed: numbers arrive as `"12.5"`, `"12"` or
//! `"<LLOQ"`, dates in several layouts. These helpers coerce a cell to the
//! wanted type and return `None` where pandas-style coercion would give a
//! missing value.

use chrono::{NaiveDate, NaiveDateTime};

use crate::config::DateFormatConfig;

/// Parse a finite floating point number
#[must_use]
pub fn parse_f64(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

/// Parse an integer, accepting integral floats such as `"124.0"`
#[must_use]
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(number) = trimmed.parse::<i64>() {
        return Some(number);
    }
    parse_f64(trimmed)
        .filter(|number| number.fract() == 0.0)
        .map(|number| number as i64)
}

/// Parse a date using the configured formats, then datetime layouts
#[must_use]
pub fn parse_date(value: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in &config.date_formats {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    for format in &config.datetime_formats {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(datetime.date());
        }
    }

    if config.enable_format_detection {
        if let Some(format) = detect_date_format(trimmed) {
            return NaiveDate::parse_from_str(trimmed, format).ok();
        }
    }

    None
}

/// Parse a `MM/YYYY` month into the first day of that month
#[must_use]
pub fn parse_month_year(value: &str) -> Option<NaiveDate> {
    let (month, year) = value.trim().split_once('/')?;
    let month = month.trim().parse::<u32>().ok()?;
    let year = year.trim().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Guess a date layout from separators and field widths
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    if s.len() == 10 && s.chars().nth(4) == Some('-') && s.chars().nth(7) == Some('-') {
        return Some("%Y-%m-%d");
    }

    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 3 {
            if parts[0].len() == 4 {
                return Some("%Y/%m/%d");
            }
            if parts[2].len() == 4 {
                // The study tables are US-formatted unless the first field cannot be a month
                return match parts[0].parse::<u8>() {
                    Ok(first) if first > 12 => Some("%d/%m/%Y"),
                    Ok(_) => Some("%m/%d/%Y"),
                    Err(_) => None,
                };
            }
        }
    }

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return Some("%Y%m%d");
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(parse_f64(" 12.5 "), Some(12.5));
        assert_eq!(parse_f64("<LLOQ"), None);
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_i64("124"), Some(124));
        assert_eq!(parse_i64("124.0"), Some(124));
        assert_eq!(parse_i64("124.5"), None);
    }

    #[test]
    fn test_date_layouts() {
        let config = DateFormatConfig::default();
        let expected = NaiveDate::from_ymd_opt(2021, 3, 14);
        assert_eq!(parse_date("2021-03-14", &config), expected);
        assert_eq!(parse_date("03/14/2021", &config), expected);
        assert_eq!(parse_date("2021-03-14 10:22:00", &config), expected);
        assert_eq!(parse_date("14-Mar-2021", &config), expected);
        assert_eq!(parse_date("not a date", &config), None);
    }

    #[test]
    fn test_month_year() {
        assert_eq!(parse_month_year("07/1948"), NaiveDate::from_ymd_opt(1948, 7, 1));
        assert_eq!(parse_month_year("13/1948"), None);
        assert_eq!(parse_month_year("1948"), None);
    }
}
