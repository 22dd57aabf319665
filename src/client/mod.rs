pub mod auth;
pub mod gsc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::period::Period;

pub use gsc::SearchConsoleClient;

/// Breakdown dimension for a search analytics query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Page,
    Query,
}

/// One search analytics query for the configured property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsQuery {
    pub period: Period,
    /// `None` aggregates the whole property into a single row.
    pub dimension: Option<Dimension>,
    pub row_limit: Option<u32>,
}

impl AnalyticsQuery {
    pub fn totals(period: Period) -> Self {
        Self {
            period,
            dimension: None,
            row_limit: None,
        }
    }

    pub fn by(period: Period, dimension: Dimension, row_limit: u32) -> Self {
        Self {
            period,
            dimension: Some(dimension),
            row_limit: Some(row_limit),
        }
    }
}

/// A row as returned by the API. `ctr` is a fraction (0.0-1.0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

impl AnalyticsRow {
    /// First dimension key, if the query was dimensioned.
    pub fn key(&self) -> Option<&str> {
        self.keys.first().map(String::as_str)
    }
}

/// Source of search analytics rows for a single property.
#[async_trait]
pub trait SearchAnalytics: Send + Sync {
    async fn query(&self, query: &AnalyticsQuery) -> Result<Vec<AnalyticsRow>>;
}

#[cfg(test)]
pub(crate) mod stub {
    use std::sync::Mutex;

    use super::*;
    use crate::error::Error;

    /// Canned responses keyed by dimension; records every query it sees.
    #[derive(Default)]
    pub struct StubAnalytics {
        pub totals: Vec<AnalyticsRow>,
        /// Overrides `totals` for specific periods.
        pub period_totals: Vec<(Period, Vec<AnalyticsRow>)>,
        pub pages: Vec<AnalyticsRow>,
        pub queries: Vec<AnalyticsRow>,
        pub fail: bool,
        pub seen: Mutex<Vec<AnalyticsQuery>>,
    }

    impl StubAnalytics {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn seen(&self) -> Vec<AnalyticsQuery> {
            self.seen.lock().unwrap().clone()
        }
    }

    pub fn row(key: Option<&str>, clicks: f64, impressions: f64, ctr: f64, position: f64) -> AnalyticsRow {
        AnalyticsRow {
            keys: key.map(|k| vec![k.to_string()]).unwrap_or_default(),
            clicks,
            impressions,
            ctr,
            position,
        }
    }

    #[async_trait]
    impl SearchAnalytics for StubAnalytics {
        async fn query(&self, query: &AnalyticsQuery) -> Result<Vec<AnalyticsRow>> {
            self.seen.lock().unwrap().push(query.clone());
            if self.fail {
                return Err(Error::Api("503 Service Unavailable".into()));
            }
            let rows = match query.dimension {
                None => self
                    .period_totals
                    .iter()
                    .find(|(p, _)| *p == query.period)
                    .map(|(_, rows)| rows)
                    .unwrap_or(&self.totals),
                Some(Dimension::Page) => &self.pages,
                Some(Dimension::Query) => &self.queries,
            };
            let limit = query.row_limit.map(|n| n as usize).unwrap_or(usize::MAX);
            Ok(rows.iter().take(limit).cloned().collect())
        }
    }
}
