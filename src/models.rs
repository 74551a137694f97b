//! Data models for collected articles and the daily aggregate.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Article`]: One post collected from a source, enriched as it moves through the run
//! - [`TrendingTopic`]: A keyword ranked by how many of the day's articles mention it
//! - [`SourceResult`]: The articles one source contributed to a run
//! - [`DailyResult`]: Everything a single run produced, keyed by its date
//!
//! Articles are never persisted as objects; they only survive as the rendered
//! JSON snapshots and Markdown report written by [`crate::outputs`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// A single post collected from a blog.
///
/// Created by the fetcher with `body` and `keywords` filled in, then handed to
/// the summarizer which sets `ai_summary`. After that it is read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Post title; an empty title marks the article as invalid.
    pub title: String,
    /// Canonical link. Unique within one source's results.
    pub url: String,
    /// Publish time normalised to UTC. `None` when the source gave nothing parseable.
    pub published_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    /// Short description shipped by the source itself (feed summary, API description).
    pub summary_raw: Option<String>,
    /// Full text fetched from the article page, capped in length.
    pub body: Option<String>,
    /// Technical terms found in the body, in detection order, without duplicates.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Tags reported by the source (only some APIs provide them).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Name of the [`crate::sources::SourceDescriptor`] that produced this article.
    pub source_name: String,
    pub language: String,
    /// LLM summary; empty when summarization failed or has not run yet.
    #[serde(default)]
    pub ai_summary: String,
}

impl Article {
    /// Start an article with only the fields every strategy knows up front.
    pub fn new(source_name: &str, language: &str, title: &str, url: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            url: url.trim().to_string(),
            published_at: None,
            author: None,
            summary_raw: None,
            body: None,
            keywords: Vec::new(),
            tags: Vec::new(),
            source_name: source_name.to_string(),
            language: language.to_string(),
            ai_summary: String::new(),
        }
    }

    /// Character count of the fetched body (0 when none was fetched).
    pub fn body_len(&self) -> usize {
        self.body.as_deref().map(|b| b.chars().count()).unwrap_or(0)
    }

    /// Publish date formatted for humans, or `N/A`.
    pub fn published_display(&self) -> String {
        self.published_at
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// A topic that several of the day's articles share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    /// Number of articles mentioning the topic; always at least 1.
    pub count: usize,
    pub description: String,
}

/// The articles a single source contributed, in fetch order.
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    #[serde(skip)]
    pub name: String,
    pub source_url: String,
    pub articles: Vec<Article>,
    pub count: usize,
}

impl SourceResult {
    pub fn new(name: &str, source_url: &str, articles: Vec<Article>) -> Self {
        let count = articles.len();
        Self {
            name: name.to_string(),
            source_url: source_url.to_string(),
            articles,
            count,
        }
    }
}

/// Aggregate output of one pipeline run.
///
/// `date` identifies the run: every file name and index entry derives from it.
/// `total_article_count` is computed from `articles_by_source` at construction
/// and the struct is not mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct DailyResult {
    #[serde(serialize_with = "serialize_date")]
    pub date: NaiveDate,
    /// Sources in fetch order. Serialized as a JSON object keyed by source name.
    #[serde(rename = "blogs", serialize_with = "serialize_sources")]
    pub articles_by_source: Vec<SourceResult>,
    #[serde(rename = "total_articles")]
    pub total_article_count: usize,
    #[serde(rename = "summary")]
    pub daily_summary: String,
    pub trending_topics: Vec<TrendingTopic>,
}

impl DailyResult {
    pub fn new(
        date: NaiveDate,
        articles_by_source: Vec<SourceResult>,
        daily_summary: String,
        trending_topics: Vec<TrendingTopic>,
    ) -> Self {
        let total_article_count = articles_by_source.iter().map(|s| s.articles.len()).sum();
        Self {
            date,
            articles_by_source,
            total_article_count,
            daily_summary,
            trending_topics,
        }
    }

    /// `YYYY-MM-DD`, the key used for every output path.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// All articles across sources, in source then fetch order.
    pub fn all_articles(&self) -> impl Iterator<Item = &Article> {
        self.articles_by_source.iter().flat_map(|s| s.articles.iter())
    }
}

fn serialize_date<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&date.format("%Y-%m-%d").to_string())
}

fn serialize_sources<S: Serializer>(sources: &[SourceResult], s: S) -> Result<S::Ok, S::Error> {
    let mut map = s.serialize_map(Some(sources.len()))?;
    for source in sources {
        map.serialize_entry(&source.name, source)?;
    }
    map.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(source: &str, url: &str) -> Article {
        let mut a = Article::new(source, "en", "Title", url);
        a.body = Some("body".to_string());
        a
    }

    #[test]
    fn test_total_matches_sum_of_sources() {
        let result = DailyResult::new(
            NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            vec![
                SourceResult::new("A", "https://a.dev", vec![article("A", "https://a.dev/1"), article("A", "https://a.dev/2")]),
                SourceResult::new("B", "https://b.dev", vec![article("B", "https://b.dev/1")]),
            ],
            String::new(),
            vec![],
        );

        let sum: usize = result.articles_by_source.iter().map(|s| s.count).sum();
        assert_eq!(result.total_article_count, 3);
        assert_eq!(result.total_article_count, sum);
        assert_eq!(result.all_articles().count(), 3);
    }

    #[test]
    fn test_daily_result_serializes_sources_as_ordered_map() {
        let result = DailyResult::new(
            NaiveDate::from_ymd_opt(2025, 5, 6).unwrap(),
            vec![
                SourceResult::new("Zeta", "https://z.dev", vec![article("Zeta", "https://z.dev/1")]),
                SourceResult::new("Alpha", "https://a.dev", vec![]),
            ],
            "summary".to_string(),
            vec![],
        );

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""date":"2025-05-06""#));
        assert!(json.contains(r#""total_articles":1"#));
        let zeta = json.find(r#""Zeta""#).unwrap();
        let alpha = json.find(r#""Alpha""#).unwrap();
        assert!(zeta < alpha, "fetch order must be kept");
    }

    #[test]
    fn test_new_article_trims_fields() {
        let a = Article::new("Dev.to", "en", "  Hello  ", " https://dev.to/x ");
        assert_eq!(a.title, "Hello");
        assert_eq!(a.url, "https://dev.to/x");
        assert_eq!(a.ai_summary, "");
        assert_eq!(a.body_len(), 0);
        assert_eq!(a.published_display(), "N/A");
    }

    #[test]
    fn test_body_len_counts_chars() {
        let mut a = Article::new("x", "ko", "t", "u");
        a.body = Some("기술블로그".to_string());
        assert_eq!(a.body_len(), 5);
    }
}
