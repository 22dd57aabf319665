use chrono::NaiveDateTime;
use serde::Serialize;

use crate::metrics::{Delta, PageEntry, PeriodMetrics, QueryEntry, VisibilityMeasurement};
use crate::period::Period;
use crate::storage::ReportRecord;

/// Number of history records shown in the trend.
pub const TREND_LENGTH: usize = 5;

/// A data source that failed during the run and was reported as zero/empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedSource {
    pub source: String,
    pub reason: String,
}

/// Everything the presenter needs for one run.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyReport {
    pub generated_at: NaiveDateTime,
    pub current_period: Period,
    pub prior_period: Period,
    pub current: PeriodMetrics,
    pub prior: PeriodMetrics,
    pub delta: Delta,
    pub visibility: VisibilityMeasurement,
    pub top_pages: Vec<PageEntry>,
    pub top_queries: Vec<QueryEntry>,
    /// Sources that failed; their numbers above are zero or empty.
    pub degraded: Vec<DegradedSource>,
    /// Trailing history, oldest first, including this run's record when saved.
    pub trend: Vec<ReportRecord>,
    /// Whether this run's record was written to the history file.
    pub saved: bool,
}

/// Inputs gathered by a run, in the order they were produced.
#[derive(Debug, Clone)]
pub struct ReportParts {
    pub generated_at: NaiveDateTime,
    pub current_period: Period,
    pub prior_period: Period,
    pub current: PeriodMetrics,
    pub prior: PeriodMetrics,
    pub delta: Delta,
    pub visibility: VisibilityMeasurement,
    pub top_pages: Vec<PageEntry>,
    pub top_queries: Vec<QueryEntry>,
    pub degraded: Vec<DegradedSource>,
    pub saved: bool,
}

/// Assemble the report. `recent` must already be the trailing history slice
/// in run order.
pub fn compose(parts: ReportParts, recent: &[ReportRecord]) -> WeeklyReport {
    WeeklyReport {
        generated_at: parts.generated_at,
        current_period: parts.current_period,
        prior_period: parts.prior_period,
        current: parts.current,
        prior: parts.prior,
        delta: parts.delta,
        visibility: parts.visibility,
        top_pages: parts.top_pages,
        top_queries: parts.top_queries,
        degraded: parts.degraded,
        trend: recent.to_vec(),
        saved: parts.saved,
    }
}

impl WeeklyReport {
    /// The trend is only meaningful with something to compare against.
    pub fn has_trend(&self) -> bool {
        self.trend.len() > 1
    }
}
