use chrono::NaiveDate;

use crate::error::{Error, Result};

/// Date format used by the Search Console API and the history file.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::DateParse(format!("{s}: {e}")))
}

/// Round to a fixed number of decimal places.
///
/// Rounds the exact binary value, so a tie like `14.25` goes to the even
/// digit and `2.675` (really `2.67499...`) rounds down.
pub fn round_to(value: f64, places: usize) -> f64 {
    format!("{value:.places$}").parse().unwrap_or(value)
}
