use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use seowatch::metrics::format_signed;
use seowatch::{Config, History, HistoryStore, Overrides, ReportRecord, RunOptions, SeoWatch, Settings, WeeklyReport};

const RULE_WIDTH: usize = 60;
const BAR_CELLS: usize = 50;

#[derive(Parser)]
#[command(name = "seowatch", about = "Weekly Search Console report and visibility history")]
struct Cli {
    /// Config file path (default: ~/.seowatch/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Search Console property (e.g. sc-domain:example.com)
    #[arg(long)]
    site: Option<String>,

    /// Service-account key file
    #[arg(long)]
    credentials: Option<PathBuf>,

    /// History file path
    #[arg(long)]
    history: Option<PathBuf>,

    /// Number of pages on the site
    #[arg(long)]
    total_pages: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query Search Console, record this week and print the report
    Report {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Do not append this run to the history file
        #[arg(long)]
        no_save: bool,
        /// Compute the windows as if run on this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
        /// Leaderboard size
        #[arg(long, default_value_t = seowatch::DEFAULT_TOP, value_parser = clap::value_parser!(u32).range(1..))]
        top: u32,
    },
    /// Show recorded history without querying the API
    History {
        /// Number of most recent records
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let settings = match &cli.config {
        Some(path) => Settings::open_at(path)?,
        None => Settings::open()?,
    };

    match cli.command {
        Commands::Config { action } => {
            handle_config(settings, action)?;
        }
        Commands::History { limit, json } => {
            let path = seowatch::config::history_path(&settings, cli.history)?;
            let store = HistoryStore::open_at(&path);
            let history = store.load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(history.recent(limit))?);
            } else {
                match trend_to_show(&history, limit) {
                    Some(recent) => print_trend(recent),
                    None => println!("No reports recorded yet in {}.", path.display()),
                }
            }
        }
        Commands::Report {
            json,
            no_save,
            as_of,
            top,
        } => {
            let overrides = Overrides {
                site_url: cli.site,
                credentials: cli.credentials,
                history_file: cli.history,
                total_pages: cli.total_pages,
                fallback_credentials: std::env::var_os("GOOGLE_APPLICATION_CREDENTIALS")
                    .map(PathBuf::from),
            };
            let config = Config::resolve(&settings, overrides)?;
            let watch = SeoWatch::connect(config).context("cannot set up Search Console client")?;

            let now = chrono::Local::now().naive_local();
            let as_of = match as_of {
                Some(s) => seowatch::date_util::parse_date(&s)?,
                None => now.date(),
            };
            let options = RunOptions {
                save: !no_save,
                top,
            };
            let report = watch.run_report(as_of, now, &options).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, watch.config(), watch.store().path());
            }
        }
    }

    Ok(())
}

fn handle_config(mut settings: Settings, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match settings.get(&key) {
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            settings.set(&key, &value)?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = settings.list();
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}

fn print_report(report: &WeeklyReport, config: &Config, history_path: &Path) {
    let rule = "=".repeat(RULE_WIDTH);
    println!("{rule}");
    println!("SEO MONITOR: {}", config.site_url);
    println!("Report Date: {}", report.generated_at.format("%Y-%m-%d %H:%M"));
    println!("{rule}");

    let m = &report.current;
    println!("\n📊 THIS WEEK ({})", report.current_period);
    println!(
        "   Clicks:      {:>6} ({} vs last week)",
        m.clicks,
        format_signed(report.delta.click_change)
    );
    println!(
        "   Impressions: {:>6} ({} vs last week)",
        m.impressions,
        format_signed(report.delta.impression_change)
    );
    println!("   CTR:         {:>5.2}%", m.ctr);
    println!("   Avg Position:{:>6.1}", m.position);

    let v = &report.visibility;
    println!("\n📈 INDEXING PROGRESS");
    println!(
        "   Pages with impressions: {} / {}",
        v.pages_with_impressions, v.total_pages
    );
    println!("   Visibility: {:.1}%", v.visibility_pct);
    println!("   {} {:.1}%", progress_bar(v.visibility_pct), v.visibility_pct);

    println!("\n🏆 TOP {} PAGES (by clicks)", report.top_pages.len());
    for (i, p) in report.top_pages.iter().enumerate() {
        println!("   {}. {}", i + 1, p.label);
        println!(
            "      {} clicks, {} impr, pos {:.1}",
            p.clicks, p.impressions, p.position
        );
    }

    println!("\n🔍 TOP {} QUERIES (by clicks)", report.top_queries.len());
    for (i, q) in report.top_queries.iter().enumerate() {
        println!("   {}. \"{}\"", i + 1, q.label);
        println!(
            "      {} clicks, {} impr, pos {:.1}",
            q.clicks, q.impressions, q.position
        );
    }

    if !report.degraded.is_empty() {
        println!("\n⚠️  INCOMPLETE DATA");
        for d in &report.degraded {
            println!("   {}: {}", d.source, d.reason);
        }
    }

    if report.has_trend() {
        println!("\n📉 HISTORICAL TREND");
        print_trend(&report.trend);
    }

    if report.saved {
        println!("\n✅ Report saved to: {}", history_path.display());
    } else {
        println!("\nReport not saved (--no-save).");
    }
    println!("{rule}");
}

/// `None` when the history file has no records at all.
fn trend_to_show(history: &History, limit: usize) -> Option<&[ReportRecord]> {
    if history.reports.is_empty() {
        None
    } else {
        Some(history.recent(limit))
    }
}

fn print_trend(records: &[ReportRecord]) {
    println!(
        "   {:<12} {:<8} {:<8} {:<8} Visibility",
        "Date", "Clicks", "Impr", "Pages"
    );
    println!("   {}", "-".repeat(50));
    for r in records {
        println!(
            "   {:<12} {:<8} {:<8} {:<8} {:.1}%",
            r.date.format("%Y-%m-%d").to_string(),
            r.clicks,
            r.impressions,
            r.pages_visible,
            r.visibility_pct
        );
    }
}

/// One filled cell per 2 percent.
fn progress_bar(pct: f64) -> String {
    let filled = ((pct / 2.0).floor().max(0.0) as usize).min(BAR_CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_CELLS - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_top_defaults_and_rejects_zero() {
        let cli = Cli::try_parse_from(["seowatch", "report"]).unwrap();
        match cli.command {
            Commands::Report { top, .. } => assert_eq!(top, seowatch::DEFAULT_TOP),
            _ => panic!("expected report"),
        }
        assert!(Cli::try_parse_from(["seowatch", "report", "--top", "0"]).is_err());
        assert!(Cli::try_parse_from(["seowatch", "report", "--top", "3"]).is_ok());
    }

    #[test]
    fn test_trend_to_show() {
        let record = ReportRecord {
            date: chrono::NaiveDate::from_ymd_opt(2024, 6, 17).unwrap(),
            period: "2024-06-07 to 2024-06-14".into(),
            clicks: 120,
            impressions: 3000,
            ctr: 4.0,
            position: 14.3,
            pages_visible: 610,
            visibility_pct: 50.0,
        };
        let history = History {
            reports: vec![record.clone(), record],
        };

        assert!(trend_to_show(&History::default(), 5).is_none());
        assert_eq!(trend_to_show(&history, 0).map(<[_]>::len), Some(0));
        assert_eq!(trend_to_show(&history, 5).map(<[_]>::len), Some(2));
    }
}
