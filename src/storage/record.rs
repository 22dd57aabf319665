use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::{PeriodMetrics, VisibilityMeasurement};
use crate::period::Period;

/// One run's summary as kept in the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    /// Day the report was generated, not the analytics window.
    pub date: NaiveDate,
    /// Analytics window label, e.g. `2024-06-07 to 2024-06-14`.
    pub period: String,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
    pub pages_visible: u64,
    pub visibility_pct: f64,
}

impl ReportRecord {
    pub fn new(
        date: NaiveDate,
        period: &Period,
        metrics: &PeriodMetrics,
        visibility: &VisibilityMeasurement,
    ) -> Self {
        Self {
            date,
            period: period.label(),
            clicks: metrics.clicks,
            impressions: metrics.impressions,
            ctr: metrics.ctr,
            position: metrics.position,
            pages_visible: visibility.pages_with_impressions,
            visibility_pct: visibility.visibility_pct,
        }
    }
}

/// Records in run order, most recent last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    #[serde(default)]
    pub reports: Vec<ReportRecord>,
}

impl History {
    /// The last `n` records, oldest first.
    pub fn recent(&self, n: usize) -> &[ReportRecord] {
        let start = self.reports.len().saturating_sub(n);
        &self.reports[start..]
    }
}
