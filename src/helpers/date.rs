//! Date helper functions

use chrono::{Datelike, Local, NaiveDate};
use std::fmt::Write as _;

/// Format a date with a chrono format string.
///
/// Falls back to ISO `YYYY-MM-DD` when the format is invalid for a plain date
/// (unknown specifiers, or time fields such as `%H`).
///
/// # Examples
/// ```ignore
/// format_date(&date, "%b %d, %Y") // -> "Jun 01, 2024"
/// ```
pub fn format_date(date: &NaiveDate, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        tracing::debug!("Invalid date format {:?}, using ISO", format);
        return iso_date(date);
    }
    out
}

/// `YYYY-MM-DD`
pub fn iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Midnight UTC of the date in RFC 3339, for feeds and `article:published_time`
pub fn date_xml(date: &NaiveDate) -> String {
    format!("{}T00:00:00Z", iso_date(date))
}

/// The current year in local time, for the footer
pub fn current_year() -> i32 {
    Local::now().year()
}
