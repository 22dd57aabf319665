use serde::{Deserialize, Serialize};

use crate::client::AnalyticsRow;
use crate::date_util::round_to;

/// Totals for one period. All zero means no data was available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate as a percentage, 2 decimals.
    pub ctr: f64,
    /// Average position, 1 decimal. Lower is better.
    pub position: f64,
}

impl PeriodMetrics {
    /// Convert an API row. `ctr` arrives as a fraction and is only rescaled.
    pub fn from_row(row: &AnalyticsRow) -> Self {
        Self {
            clicks: row.clicks as u64,
            impressions: row.impressions as u64,
            ctr: round_to(row.ctr * 100.0, 2),
            position: round_to(row.position, 1),
        }
    }
}

/// A page on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageEntry {
    /// Page path with the site origin removed.
    pub page: String,
    /// `page` shortened for display.
    pub label: String,
    pub clicks: u64,
    pub impressions: u64,
    pub position: f64,
}

/// A search query on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEntry {
    pub query: String,
    pub label: String,
    pub clicks: u64,
    pub impressions: u64,
    pub position: f64,
}

/// How much of the known page corpus showed up in search at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilityMeasurement {
    pub pages_with_impressions: u64,
    pub total_pages: u32,
    /// Percentage, 1 decimal, clamped to `[0, 100]`.
    pub visibility_pct: f64,
}

impl VisibilityMeasurement {
    pub fn new(pages_with_impressions: u64, total_pages: u32) -> Self {
        let visibility_pct = if total_pages == 0 {
            0.0
        } else {
            let pct = pages_with_impressions as f64 / total_pages as f64 * 100.0;
            round_to(pct, 1).clamp(0.0, 100.0)
        };
        Self {
            pages_with_impressions,
            total_pages,
            visibility_pct,
        }
    }
}

/// Week-over-week change in the count fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Delta {
    pub click_change: i64,
    pub impression_change: i64,
}

/// Result of a fail-soft analytics fetch.
///
/// `Empty` and `Unavailable` both degrade to the default value, but stay
/// distinguishable so a report can say which numbers are missing because
/// of a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fetched(T),
    /// The source answered with no rows.
    Empty,
    /// The source failed; carries the error message.
    Unavailable(String),
}

impl<T: Default> Outcome<T> {
    pub fn value(self) -> T {
        match self {
            Outcome::Fetched(v) => v,
            Outcome::Empty | Outcome::Unavailable(_) => T::default(),
        }
    }
}

impl<T> Outcome<T> {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Outcome::Unavailable(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Unavailable(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Fetched(v) => Outcome::Fetched(f(v)),
            Outcome::Empty => Outcome::Empty,
            Outcome::Unavailable(reason) => Outcome::Unavailable(reason),
        }
    }
}
