pub mod client;
pub mod config;
pub mod date_util;
pub mod error;
pub mod metrics;
pub mod period;
pub mod report;
pub mod storage;

pub use client::{AnalyticsQuery, AnalyticsRow, Dimension, SearchAnalytics, SearchConsoleClient};
pub use config::{Config, Overrides, Settings};
pub use error::{Error, Result};
pub use metrics::{
    Delta, Outcome, PageEntry, PeriodMetrics, QueryEntry, VisibilityMeasurement,
};
pub use period::Period;
pub use report::{DegradedSource, WeeklyReport};
pub use storage::{History, HistoryStore, ReportRecord};

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use report::ReportParts;

/// Leaderboard size used when the caller does not ask for another.
pub const DEFAULT_TOP: u32 = 5;

/// Options for a single report run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Append this run's record to the history file.
    pub save: bool,
    /// Leaderboard size for pages and queries.
    pub top: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            save: true,
            top: DEFAULT_TOP,
        }
    }
}

/// Main entry point: one Search Console property, one history file.
pub struct SeoWatch {
    config: Config,
    client: Arc<dyn SearchAnalytics>,
    store: HistoryStore,
}

impl SeoWatch {
    pub fn new(config: Config, client: Arc<dyn SearchAnalytics>) -> Self {
        let store = HistoryStore::open_at(&config.history_path);
        Self {
            config,
            client,
            store,
        }
    }

    /// Build with the Search Console client for the configured property.
    pub fn connect(config: Config) -> Result<Self> {
        let client = SearchConsoleClient::from_key_file(&config.site_url, &config.credentials_path)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Produce the weekly report.
    ///
    /// Windows are computed from `as_of`; the history record is dated with the
    /// day of `generated_at`. Analytics faults degrade to zero/empty values and
    /// are listed in the report. History faults abort the run.
    pub async fn run_report(
        &self,
        as_of: NaiveDate,
        generated_at: NaiveDateTime,
        options: &RunOptions,
    ) -> Result<WeeklyReport> {
        let current_period = Period::current(as_of);
        let prior_period = Period::prior(as_of);
        log::info!(
            "Reporting {} against {} for {}",
            current_period,
            prior_period,
            self.config.site_url
        );

        let client = self.client.as_ref();
        let (current, prior, visible) = tokio::join!(
            metrics::aggregate(client, &current_period),
            metrics::aggregate(client, &prior_period),
            metrics::count_visible_pages(client, &current_period),
        );

        let mut degraded = Vec::new();
        note_degraded(&mut degraded, "this week totals", &current);
        note_degraded(&mut degraded, "last week totals", &prior);
        note_degraded(&mut degraded, "page visibility", &visible);

        let current = current.value();
        let prior = prior.value();
        let delta = metrics::delta(&current, &prior);
        let visibility = VisibilityMeasurement::new(visible.value(), self.config.total_pages);

        let (pages, queries) = tokio::join!(
            metrics::top_pages(client, &current_period, options.top, &self.config.site_origin),
            metrics::top_queries(client, &current_period, options.top),
        );
        note_degraded(&mut degraded, "top pages", &pages);
        note_degraded(&mut degraded, "top queries", &queries);

        let mut history = self.store.load()?;
        let record = ReportRecord::new(generated_at.date(), &current_period, &current, &visibility);
        if options.save {
            self.store.append_and_save(&mut history, record)?;
        } else {
            history.reports.push(record);
        }

        let parts = ReportParts {
            generated_at,
            current_period,
            prior_period,
            current,
            prior,
            delta,
            visibility,
            top_pages: pages.value(),
            top_queries: queries.value(),
            degraded,
            saved: options.save,
        };
        Ok(report::compose(parts, history.recent(report::TREND_LENGTH)))
    }

    /// The last `limit` history records, oldest first.
    pub fn history(&self, limit: usize) -> Result<Vec<ReportRecord>> {
        Ok(self.store.load()?.recent(limit).to_vec())
    }
}

fn note_degraded<T>(degraded: &mut Vec<DegradedSource>, source: &str, outcome: &Outcome<T>) {
    if let Some(reason) = outcome.reason() {
        degraded.push(DegradedSource {
            source: source.to_string(),
            reason: reason.to_string(),
        });
    }
}
