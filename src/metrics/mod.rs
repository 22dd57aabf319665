pub mod types;

pub use types::*;

use crate::client::{AnalyticsQuery, AnalyticsRow, Dimension, SearchAnalytics};
use crate::date_util::round_to;
use crate::period::Period;

/// Row cap for the page-visibility count.
pub const VISIBLE_PAGES_ROW_LIMIT: u32 = 2000;
/// Page labels longer than this are cut and get a `...` suffix.
pub const PAGE_LABEL_MAX: usize = 50;
/// Query labels are cut to this many characters.
pub const QUERY_LABEL_MAX: usize = 40;

/// Run a query, turning any fault into `Unavailable` and no rows into `Empty`.
async fn fetch(
    client: &dyn SearchAnalytics,
    what: &str,
    query: AnalyticsQuery,
) -> Outcome<Vec<AnalyticsRow>> {
    match client.query(&query).await {
        Ok(rows) if rows.is_empty() => {
            log::info!("No {what} data for {}", query.period);
            Outcome::Empty
        }
        Ok(rows) => Outcome::Fetched(rows),
        Err(e) => {
            log::warn!("Could not fetch {what} for {}: {e}", query.period);
            Outcome::Unavailable(e.to_string())
        }
    }
}

/// Property-wide totals for a period, from a query with no dimensions.
pub async fn aggregate(client: &dyn SearchAnalytics, period: &Period) -> Outcome<PeriodMetrics> {
    fetch(client, "totals", AnalyticsQuery::totals(*period))
        .await
        .map(|rows| PeriodMetrics::from_row(&rows[0]))
}

/// Number of pages with at least one impression in the period. Each row of
/// a page-dimensioned query is one such page.
pub async fn count_visible_pages(client: &dyn SearchAnalytics, period: &Period) -> Outcome<u64> {
    let query = AnalyticsQuery::by(*period, Dimension::Page, VISIBLE_PAGES_ROW_LIMIT);
    fetch(client, "page visibility", query)
        .await
        .map(|rows| rows.len() as u64)
}

/// Top pages by clicks, with `site_origin` stripped from each URL.
pub async fn top_pages(
    client: &dyn SearchAnalytics,
    period: &Period,
    limit: u32,
    site_origin: &str,
) -> Outcome<Vec<PageEntry>> {
    let query = AnalyticsQuery::by(*period, Dimension::Page, limit);
    fetch(client, "top pages", query).await.map(|rows| {
        let mut entries: Vec<PageEntry> = rows
            .iter()
            .map(|row| {
                let url = row.key().unwrap_or_default();
                let page = url.strip_prefix(site_origin).unwrap_or(url).to_string();
                PageEntry {
                    label: truncate_label(&page, PAGE_LABEL_MAX, "..."),
                    page,
                    clicks: row.clicks as u64,
                    impressions: row.impressions as u64,
                    position: round_to(row.position, 1),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.clicks.cmp(&a.clicks));
        entries
    })
}

/// Top search queries by clicks.
pub async fn top_queries(
    client: &dyn SearchAnalytics,
    period: &Period,
    limit: u32,
) -> Outcome<Vec<QueryEntry>> {
    let query = AnalyticsQuery::by(*period, Dimension::Query, limit);
    fetch(client, "top queries", query).await.map(|rows| {
        let mut entries: Vec<QueryEntry> = rows
            .iter()
            .map(|row| {
                let query = row.key().unwrap_or_default().to_string();
                QueryEntry {
                    label: truncate_label(&query, QUERY_LABEL_MAX, ""),
                    query,
                    clicks: row.clicks as u64,
                    impressions: row.impressions as u64,
                    position: round_to(row.position, 1),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.clicks.cmp(&a.clicks));
        entries
    })
}

/// Signed change from `prior` to `current`.
pub fn delta(current: &PeriodMetrics, prior: &PeriodMetrics) -> Delta {
    Delta {
        click_change: current.clicks as i64 - prior.clicks as i64,
        impression_change: current.impressions as i64 - prior.impressions as i64,
    }
}

/// Format with an explicit `+` for zero and positive values.
pub fn format_signed(n: i64) -> String {
    if n >= 0 {
        format!("+{n}")
    } else {
        n.to_string()
    }
}

/// Keep the first `max` characters, appending `marker` if anything was cut.
fn truncate_label(s: &str, max: usize, marker: &str) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    out.push_str(marker);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::stub::{row, StubAnalytics};
    use chrono::NaiveDate;

    const ORIGIN: &str = "https://example.com";

    fn week() -> Period {
        Period::current(NaiveDate::from_ymd_opt(2024, 6, 17).unwrap())
    }

    fn metrics(clicks: u64, impressions: u64) -> PeriodMetrics {
        PeriodMetrics {
            clicks,
            impressions,
            ctr: 0.0,
            position: 0.0,
        }
    }

    #[tokio::test]
    async fn test_aggregate_converts_row() {
        let client = StubAnalytics {
            totals: vec![row(None, 120.0, 3000.0, 0.04, 14.263)],
            ..Default::default()
        };

        let outcome = aggregate(&client, &week()).await;
        assert_eq!(
            outcome,
            Outcome::Fetched(PeriodMetrics {
                clicks: 120,
                impressions: 3000,
                ctr: 4.0,
                position: 14.3,
            })
        );

        let seen = client.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].dimension, None);
        assert_eq!(seen[0].row_limit, None);
    }

    #[tokio::test]
    async fn test_aggregate_rounds_ctr() {
        let client = StubAnalytics {
            totals: vec![row(None, 7.0, 1234.0, 0.005_672_6, 22.04)],
            ..Default::default()
        };
        let m = aggregate(&client, &week()).await.value();
        assert_eq!(m.ctr, 0.57);
        assert_eq!(m.position, 22.0);
    }

    #[tokio::test]
    async fn test_aggregate_no_rows_is_zero() {
        let client = StubAnalytics::default();
        let outcome = aggregate(&client, &week()).await;
        assert_eq!(outcome, Outcome::Empty);
        assert_eq!(outcome.value(), PeriodMetrics::default());
    }

    #[tokio::test]
    async fn test_aggregate_fault_is_zero() {
        let client = StubAnalytics::failing();
        let outcome = aggregate(&client, &week()).await;
        assert!(outcome.is_unavailable());
        assert!(outcome.reason().unwrap().contains("503"));
        let m = outcome.value();
        assert_eq!(m.clicks, 0);
        assert_eq!(m.impressions, 0);
        assert_eq!(m.ctr, 0.0);
        assert_eq!(m.position, 0.0);
    }

    #[tokio::test]
    async fn test_count_visible_pages() {
        let pages = (0..37)
            .map(|i| row(Some(&format!("{ORIGIN}/p/{i}")), 0.0, 1.0, 0.0, 40.0))
            .collect();
        let client = StubAnalytics {
            pages,
            ..Default::default()
        };

        assert_eq!(count_visible_pages(&client, &week()).await, Outcome::Fetched(37));
        let seen = client.seen();
        assert_eq!(seen[0].dimension, Some(Dimension::Page));
        assert_eq!(seen[0].row_limit, Some(VISIBLE_PAGES_ROW_LIMIT));
    }

    #[tokio::test]
    async fn test_count_visible_pages_fault() {
        let client = StubAnalytics::failing();
        assert_eq!(count_visible_pages(&client, &week()).await.value(), 0);
    }

    #[tokio::test]
    async fn test_top_pages_strips_origin_and_truncates() {
        let long = format!("{ORIGIN}/blog/{}", "a".repeat(60));
        let client = StubAnalytics {
            pages: vec![
                row(Some(&format!("{ORIGIN}/guide")), 30.0, 900.0, 0.03, 3.27),
                row(Some(&long), 12.0, 400.0, 0.03, 7.0),
            ],
            ..Default::default()
        };

        let pages = top_pages(&client, &week(), 5, ORIGIN).await.value();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].page, "/guide");
        assert_eq!(pages[0].label, "/guide");
        assert_eq!(pages[0].position, 3.3);

        assert_eq!(pages[1].page, format!("/blog/{}", "a".repeat(60)));
        assert_eq!(pages[1].label.chars().count(), PAGE_LABEL_MAX + 3);
        assert!(pages[1].label.ends_with("..."));
        assert!(pages[1].label.starts_with("/blog/aaa"));

        assert_eq!(client.seen()[0].row_limit, Some(5));
    }

    #[tokio::test]
    async fn test_top_pages_foreign_origin_kept() {
        let client = StubAnalytics {
            pages: vec![row(Some("https://cdn.example.net/x"), 1.0, 2.0, 0.5, 1.0)],
            ..Default::default()
        };
        let pages = top_pages(&client, &week(), 5, ORIGIN).await.value();
        assert_eq!(pages[0].page, "https://cdn.example.net/x");
    }

    #[tokio::test]
    async fn test_top_pages_sorted_by_clicks() {
        let client = StubAnalytics {
            pages: vec![
                row(Some("/a"), 2.0, 10.0, 0.2, 5.0),
                row(Some("/b"), 9.0, 10.0, 0.9, 5.0),
                row(Some("/c"), 2.0, 50.0, 0.04, 5.0),
            ],
            ..Default::default()
        };
        let pages = top_pages(&client, &week(), 5, ORIGIN).await.value();
        let order: Vec<&str> = pages.iter().map(|p| p.page.as_str()).collect();
        // ties keep source order
        assert_eq!(order, vec!["/b", "/a", "/c"]);
    }

    #[tokio::test]
    async fn test_top_queries_truncates_without_marker() {
        let long = "how to winterize a travel trailer water heater bypass valve";
        let client = StubAnalytics {
            queries: vec![
                row(Some("rv dump stations"), 14.0, 210.0, 0.07, 6.12),
                row(Some(long), 3.0, 80.0, 0.04, 9.0),
            ],
            ..Default::default()
        };

        let queries = top_queries(&client, &week(), 5).await.value();
        assert_eq!(queries[0].label, "rv dump stations");
        assert_eq!(queries[0].position, 6.1);
        assert_eq!(queries[1].query, long);
        assert_eq!(queries[1].label, long.chars().take(40).collect::<String>());
        assert_eq!(client.seen()[0].dimension, Some(Dimension::Query));
    }

    #[tokio::test]
    async fn test_leaderboards_fault_is_empty() {
        let client = StubAnalytics::failing();
        let pages = top_pages(&client, &week(), 5, ORIGIN).await;
        assert!(pages.is_unavailable());
        assert!(pages.value().is_empty());
        assert!(top_queries(&client, &week(), 5).await.value().is_empty());
    }

    #[test]
    fn test_delta() {
        let d = delta(&metrics(120, 3000), &metrics(100, 2800));
        assert_eq!(
            d,
            Delta {
                click_change: 20,
                impression_change: 200
            }
        );
    }

    #[test]
    fn test_delta_decrease_is_negative() {
        let d = delta(&metrics(40, 1000), &metrics(55, 1300));
        assert_eq!(d.click_change, -15);
        assert_eq!(d.impression_change, -300);
    }

    #[test]
    fn test_delta_identical_is_zero() {
        for m in [metrics(0, 0), metrics(7, 93), metrics(u32::MAX as u64, 1)] {
            assert_eq!(delta(&m, &m), Delta::default());
        }
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(20), "+20");
        assert_eq!(format_signed(0), "+0");
        assert_eq!(format_signed(-7), "-7");
    }

    #[test]
    fn test_visibility() {
        let v = VisibilityMeasurement::new(610, 1220);
        assert_eq!(v.visibility_pct, 50.0);
        assert_eq!(VisibilityMeasurement::new(1, 3).visibility_pct, 33.3);
        assert_eq!(VisibilityMeasurement::new(0, 1220).visibility_pct, 0.0);
    }

    #[test]
    fn test_visibility_ties_round_to_even() {
        assert_eq!(VisibilityMeasurement::new(1, 400).visibility_pct, 0.2);
        assert_eq!(VisibilityMeasurement::new(3, 8).visibility_pct, 37.5);
        assert_eq!(VisibilityMeasurement::new(3, 400).visibility_pct, 0.8);
    }

    #[test]
    fn test_visibility_bounded_and_monotonic() {
        let total = 1220;
        let mut last = 0.0;
        for pages in 0..=3000u64 {
            let pct = VisibilityMeasurement::new(pages, total).visibility_pct;
            assert!((0.0..=100.0).contains(&pct), "{pages} -> {pct}");
            assert!(pct >= last, "{pages} -> {pct} < {last}");
            last = pct;
        }
        assert_eq!(VisibilityMeasurement::new(5000, total).visibility_pct, 100.0);
    }

    #[test]
    fn test_visibility_zero_total() {
        assert_eq!(VisibilityMeasurement::new(10, 0).visibility_pct, 0.0);
    }

    #[test]
    fn test_truncate_label_multibyte() {
        let s = "é".repeat(45);
        let label = truncate_label(&s, 40, "");
        assert_eq!(label.chars().count(), 40);
    }
}
