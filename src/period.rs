use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::date_util::format_date;

/// Search Console data lags behind real time by this many days.
pub const REPORTING_LAG_DAYS: i64 = 3;

/// Length of one comparison window.
pub const WINDOW_DAYS: i64 = 7;

/// A query window over the analytics data. Both dates are passed to the API
/// as given; `end - start` is the window length in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window ending `REPORTING_LAG_DAYS` before `today` and reaching back
    /// `days_back` days from there.
    pub fn trailing(today: NaiveDate, days_back: i64) -> Self {
        let end = today - Duration::days(REPORTING_LAG_DAYS);
        Self {
            start: end - Duration::days(days_back),
            end,
        }
    }

    /// This week: `[today - 10, today - 3]`.
    pub fn current(today: NaiveDate) -> Self {
        Self::trailing(today, WINDOW_DAYS)
    }

    /// Last week: `[today - 17, today - 10]`.
    ///
    /// Starts from the 14-day trailing window and pulls its end back to the
    /// start of the current window, so the two windows share the boundary
    /// date and have the same length.
    pub fn prior(today: NaiveDate) -> Self {
        let wide = Self::trailing(today, 2 * WINDOW_DAYS);
        Self {
            start: wide.start,
            end: today - Duration::days(REPORTING_LAG_DAYS + WINDOW_DAYS),
        }
    }

    /// Number of days between start and end.
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn start_key(&self) -> String {
        format_date(self.start)
    }

    pub fn end_key(&self) -> String {
        format_date(self.end)
    }

    /// Human-readable label, e.g. `2024-06-07 to 2024-06-14`.
    pub fn label(&self) -> String {
        format!("{} to {}", self.start_key(), self.end_key())
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
