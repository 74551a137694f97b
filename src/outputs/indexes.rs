//! Cross-run index files.
//!
//! # Index Files
//!
//! - **index.json**: [`CrawlIndex`], the machine-readable crawl history with
//!   aggregate statistics
//! - **README.md**: one link line per daily report, newest first
//!
//! # Replace, never append
//!
//! Both files are keyed by date. Re-running a date replaces its entry, so
//! neither file ever holds two entries for the same day. Both are written
//! with [`write_atomic`] so a reader never sees a half-written document.

use crate::models::DailyResult;
use crate::outputs::markdown::report_file_name;
use crate::utils::write_atomic;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const INDEX_FILE: &str = "index.json";
pub const README_FILE: &str = "README.md";

const README_HEADER: &str = "# Tech Blog Trends\n\n\
> Engineering blog activity, collected and summarized every day.\n\n\
## Daily Digests\n\n";

/// One run in the crawl history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// `YYYY-MM-DD`; unique within the index.
    pub date: String,
    pub total_articles: usize,
    pub blogs_crawled: usize,
    #[serde(rename = "trending_topics")]
    pub trending_topic_count: usize,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn from_result(result: &DailyResult, now: DateTime<Utc>) -> Self {
        Self {
            date: result.date_key(),
            total_articles: result.total_article_count,
            blogs_crawled: result.articles_by_source.len(),
            trending_topic_count: result.trending_topics.len(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Aggregates over the retained history only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatistics {
    #[serde(default)]
    pub total_crawls: usize,
    #[serde(default)]
    pub total_articles_collected: usize,
    #[serde(default)]
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlIndex {
    #[serde(default)]
    pub crawling_history: Vec<HistoryEntry>,
    #[serde(default)]
    pub statistics: IndexStatistics,
}

impl CrawlIndex {
    /// Insert `entry`, replacing any entry for the same date, keep the newest
    /// `keep` entries and recompute the statistics from them.
    pub fn record(&mut self, entry: HistoryEntry, keep: usize, now: DateTime<Utc>) {
        self.crawling_history.retain(|e| e.date != entry.date);
        self.crawling_history.push(entry);
        self.crawling_history.sort_by(|a, b| b.date.cmp(&a.date));
        self.crawling_history.truncate(keep);

        self.statistics = IndexStatistics {
            total_crawls: self.crawling_history.len(),
            total_articles_collected: self.crawling_history.iter().map(|e| e.total_articles).sum(),
            last_updated: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
    }
}

/// Read `path`, or start an empty index when it does not exist yet.
pub async fn load_index(path: &Path) -> Result<CrawlIndex, Box<dyn Error>> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CrawlIndex::default()),
        Err(e) => Err(e.into()),
    }
}

/// Record `result` in the crawl index at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), date = %result.date_key()))]
pub async fn update_crawl_index(
    path: &Path,
    result: &DailyResult,
    now: DateTime<Utc>,
    history_days: usize,
) -> Result<(), Box<dyn Error>> {
    let mut index = load_index(path).await?;
    index.record(HistoryEntry::from_result(result, now), history_days, now);
    write_atomic(path, serde_json::to_string_pretty(&index)?.as_bytes()).await?;
    info!(
        entries = index.crawling_history.len(),
        total_articles = index.statistics.total_articles_collected,
        "Updated crawl index"
    );
    Ok(())
}

/// The README line linking one day's report.
pub fn readme_line(date_key: &str, article_count: usize) -> String {
    format!("- [{date_key}]({}) - {article_count} articles", report_file_name(date_key))
}

/// Date of a README entry line, if `line` is one.
fn entry_date(line: &str) -> Option<&str> {
    let (date, _) = line.strip_prefix("- [")?.split_once(']')?;
    let is_date = date.len() == 10 && date.chars().all(|c| c.is_ascii_digit() || c == '-');
    is_date.then_some(date)
}

/// Put the entry for `date_key` into `content`: any existing line for that
/// date is removed, then the new line goes before the first older entry (or at
/// the end when none is older).
pub fn insert_readme_entry(content: &str, date_key: &str, article_count: usize) -> String {
    let mut lines: Vec<&str> = content.lines().filter(|l| entry_date(l) != Some(date_key)).collect();
    let entry = readme_line(date_key, article_count);

    match lines.iter().position(|l| entry_date(l).is_some_and(|d| d < date_key)) {
        Some(i) => lines.insert(i, &entry),
        None => lines.push(&entry),
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Add or replace the README line for `result`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), date = %result.date_key()))]
pub async fn update_readme(path: &Path, result: &DailyResult) -> Result<(), Box<dyn Error>> {
    let content = match fs::read_to_string(path).await {
        Ok(existing) => existing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => README_HEADER.to_string(),
        Err(e) => return Err(e.into()),
    };
    let updated = insert_readme_entry(&content, &result.date_key(), result.total_article_count);
    write_atomic(path, updated.as_bytes()).await?;
    info!("Updated README index");
    Ok(())
}
