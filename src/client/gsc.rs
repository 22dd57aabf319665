use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::auth::{ServiceAccountKey, TokenProvider};
use super::{AnalyticsQuery, AnalyticsRow, Dimension, SearchAnalytics};
use crate::error::{Error, Result};

const API_BASE: &str = "https://www.googleapis.com/webmasters/v3/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    start_date: String,
    end_date: String,
    dimensions: Vec<Dimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    row_limit: Option<u32>,
}

impl From<&AnalyticsQuery> for QueryBody {
    fn from(q: &AnalyticsQuery) -> Self {
        Self {
            start_date: q.period.start_key(),
            end_date: q.period.end_key(),
            dimensions: q.dimension.into_iter().collect(),
            row_limit: q.row_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    rows: Vec<AnalyticsRow>,
}

/// Search Console `searchAnalytics.query` client bound to one property.
pub struct SearchConsoleClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    endpoint: Url,
}

impl SearchConsoleClient {
    /// Build a client for `site_url` authenticating with the service-account
    /// key at `credentials`.
    pub fn from_key_file(site_url: &str, credentials: &Path) -> Result<Self> {
        let key = ServiceAccountKey::from_file(credentials)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("seowatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let tokens = TokenProvider::new(key, http.clone())?;
        let endpoint = query_url(API_BASE, site_url)?;
        Ok(Self {
            http,
            tokens,
            endpoint,
        })
    }
}

/// Build `{base}sites/{site}/searchAnalytics/query` with the site percent-encoded
/// as a single path segment.
fn query_url(base: &str, site_url: &str) -> Result<Url> {
    let mut url = Url::parse(base).map_err(|e| Error::Config(format!("bad API base: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("bad API base: {base}")))?
        .pop_if_empty()
        .extend(["sites", site_url, "searchAnalytics", "query"]);
    Ok(url)
}

#[async_trait]
impl SearchAnalytics for SearchConsoleClient {
    async fn query(&self, query: &AnalyticsQuery) -> Result<Vec<AnalyticsRow>> {
        let token = self.tokens.access_token().await?;
        let body = QueryBody::from(query);
        log::debug!(
            "searchAnalytics.query {} dimensions={:?} rowLimit={:?}",
            query.period,
            body.dimensions,
            body.row_limit
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {text}")));
        }

        let parsed: QueryResponse = response.json().await?;
        Ok(parsed.rows)
    }
}
