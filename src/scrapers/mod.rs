//! Content fetching for every source strategy.
//!
//! Each source is fetched in two phases, following the same shape for every
//! strategy:
//!
//! 1. **Listing**: retrieve the feed, API page or HTML page and decode it
//!    into [`Article`]s carrying title, link, date and author
//! 2. **Enrichment**: for entries inside the lookback window, fetch the full
//!    body (through the [`cache::BodyCache`]) and derive keywords
//!
//! # Strategies
//!
//! | Strategy | Module | Notes |
//! |----------|--------|-------|
//! | RSS / Atom | [`rss`] | Preferred whenever a feed exists |
//! | Dev.to API | [`devto`] | JSON array of articles |
//! | Naver D2 API | [`naver_d2`] | Paged JSON, relative links |
//! | HTML | [`html`] | Selector-driven; also used for bodies |
//!
//! Any error while fetching one source is logged and turns into an empty
//! result for that source; it never aborts the run.

pub mod cache;
pub mod devto;
pub mod html;
pub mod keywords;
pub mod naver_d2;
pub mod rss;

use crate::config::CrawlSettings;
use crate::context::RunContext;
use crate::models::Article;
use crate::sources::{ApiAdapter, FetchStrategy, SourceDescriptor};
use crate::utils::truncate_chars;
use cache::BodyCache;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};

/// HTTP client, body cache and crawl limits shared by every source of a run.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    cache: BodyCache,
    settings: CrawlSettings,
}

fn is_fresh(article: &Article, cutoff: DateTime<Utc>) -> bool {
    article.published_at.is_some_and(|p| p >= cutoff)
}

impl Fetcher {
    /// Build the shared client. Every request inherits the configured timeout.
    pub fn new(settings: CrawlSettings, cache: BodyCache) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.clone())
            .build()?;
        debug!(cache_dir = %cache.dir().display(), timeout_secs = settings.timeout.as_secs(), "Fetcher ready");
        Ok(Self {
            client,
            cache,
            settings,
        })
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Fetch the fresh articles of `source`.
    ///
    /// Only entries whose publish time is known and inside the lookback
    /// window are kept and enriched. Failures yield an empty `Vec`.
    #[instrument(level = "info", skip_all, fields(source = %source.name, strategy = ?source.effective_strategy()))]
    pub async fn fetch(&self, source: &SourceDescriptor, ctx: &RunContext) -> Vec<Article> {
        match self.try_fetch(source, ctx).await {
            Ok(articles) => {
                info!(count = articles.len(), "Fetched source");
                articles
            }
            Err(e) => {
                error!(error = %e, "Source fetch failed; continuing with no articles");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self, source: &SourceDescriptor, ctx: &RunContext) -> Result<Vec<Article>, Box<dyn Error>> {
        let endpoint = source
            .endpoint()
            .ok_or_else(|| format!("no endpoint for source '{}'", source.name))?;

        match source.effective_strategy() {
            FetchStrategy::Rss => {
                let xml = self.get_text(endpoint).await?;
                self.articles_from_feed(&xml, source, ctx.cutoff()).await
            }
            FetchStrategy::Api => {
                let listed = match source.api_adapter {
                    Some(ApiAdapter::Devto) => {
                        let url = devto::listing_url(endpoint)?;
                        devto::decode(&self.get_text(url.as_str()).await?, source)?
                    }
                    Some(ApiAdapter::NaverD2) => {
                        let url = naver_d2::listing_url(endpoint)?;
                        naver_d2::decode(&self.get_text(url.as_str()).await?, source)?
                    }
                    None => return Err(format!("api source '{}' has no adapter", source.name).into()),
                };
                Ok(self.enrich_fresh(listed, source, ctx.cutoff()).await)
            }
            FetchStrategy::Html => {
                let page = self.get_text(endpoint).await?;
                let listed = html::parse_listing(&page, endpoint, source)?;
                Ok(self.enrich_fresh(listed, source, ctx.cutoff()).await)
            }
        }
    }

    /// Parse a feed document and enrich its fresh entries.
    pub async fn articles_from_feed(
        &self,
        xml: &str,
        source: &SourceDescriptor,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Article>, Box<dyn Error>> {
        let listed: Vec<Article> = rss::parse_feed(xml)?
            .into_iter()
            .map(|entry| entry.into_article(source))
            .collect();
        Ok(self.enrich_fresh(listed, source, cutoff).await)
    }

    async fn enrich_fresh(&self, listed: Vec<Article>, source: &SourceDescriptor, cutoff: DateTime<Utc>) -> Vec<Article> {
        let total = listed.len();
        let fresh: Vec<Article> = listed.into_iter().filter(|a| is_fresh(a, cutoff)).collect();
        debug!(total, fresh = fresh.len(), %cutoff, "Filtered listing by lookback window");

        let selectors = source.content_selectors();
        stream::iter(fresh)
            .then(|mut article| {
                let selectors = &selectors;
                async move {
                    article.body = self.fetch_body(&article.url, selectors).await;
                    if let Some(body) = article.body.as_deref() {
                        article.keywords = keywords::extract_keywords(body, self.settings.keywords_per_article);
                    }
                    article
                }
            })
            .collect()
            .await
    }

    /// Full text of the page at `url`.
    ///
    /// Served from the cache when present, with no network call. Otherwise the
    /// page is fetched, the first matching selector's text is capped at
    /// `max_body_chars` and stored. Returns `None` when nothing could be
    /// fetched or extracted.
    #[instrument(level = "debug", skip_all, fields(%url))]
    pub async fn fetch_body(&self, url: &str, selectors: &[String]) -> Option<String> {
        if url.is_empty() {
            return None;
        }
        if let Some(cached) = self.cache.get(url).await {
            // An empty entry records a page with no extractable body.
            return (!cached.is_empty()).then_some(cached);
        }

        let page = match self.get_text(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, "Body fetch failed");
                return None;
            }
        };
        let body = html::extract_body(&page, selectors)
            .map(|text| truncate_chars(&text, self.settings.max_body_chars))
            .unwrap_or_default();

        if let Err(e) = self.cache.put(url, &body).await {
            warn!(error = %e, "Could not write body cache");
        }
        if body.is_empty() { None } else { Some(body) }
    }

    async fn get_text(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let resp = self.client.get(url).send().await?.error_for_status()?;
        Ok(resp.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::sources::{FieldSelectors, OneOrMany};
    use chrono::{Duration, TimeZone};

    // Nothing listens on the discard port, so any real request fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn fetcher(cache_dir: &std::path::Path) -> Fetcher {
        let settings = CrawlSettings {
            timeout: std::time::Duration::from_secs(2),
            ..CrawlSettings::default()
        };
        Fetcher::new(settings, BodyCache::new(cache_dir)).unwrap()
    }

    fn feed_source() -> SourceDescriptor {
        SourceDescriptor {
            name: "Local Feed".to_string(),
            url: format!("{UNREACHABLE}/"),
            strategy: FetchStrategy::Rss,
            rss_feed: Some(format!("{UNREACHABLE}/feed")),
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                content: OneOrMany::One("article".to_string()),
                ..FieldSelectors::default()
            },
            language: "en".to_string(),
            description: String::new(),
        }
    }

    fn three_entry_feed() -> String {
        format!(
            r#"<rss version="2.0"><channel><title>t</title>
              <item><title>Fresh one</title><link>{u}/posts/1</link><pubDate>Tue, 06 May 2025 08:00:00 +0000</pubDate></item>
              <item><title>Fresh two</title><link>{u}/posts/2</link><pubDate>Mon, 05 May 2025 20:00:00 +0000</pubDate></item>
              <item><title>Old one</title><link>{u}/posts/3</link><pubDate>Sat, 03 May 2025 08:00:00 +0000</pubDate></item>
            </channel></rss>"#,
            u = UNREACHABLE
        )
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_network_call() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let url = format!("{UNREACHABLE}/posts/cached");
        fetcher.cache.put(&url, "cached body about Rust").await.unwrap();

        let first = fetcher.fetch_body(&url, &["article".to_string()]).await;
        let second = fetcher.fetch_body(&url, &["article".to_string()]).await;
        assert_eq!(first.as_deref(), Some("cached body about Rust"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_body_fetch_failure_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let body = fetcher.fetch_body(&format!("{UNREACHABLE}/missing"), &["article".to_string()]).await;
        assert_eq!(body, None);
        assert_eq!(fetcher.cache.get(&format!("{UNREACHABLE}/missing")).await, None);
    }

    #[tokio::test]
    async fn test_feed_keeps_only_entries_inside_lookback() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let source = feed_source();
        let body = "Kubernetes operators written in Rust. ".repeat(10);
        for n in 1..=2 {
            fetcher.cache.put(&format!("{UNREACHABLE}/posts/{n}"), &body).await.unwrap();
        }

        let now = Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap();
        let cutoff = now - Duration::days(1);
        let fetched = fetcher.articles_from_feed(&three_entry_feed(), &source, cutoff).await.unwrap();
        let articles = normalize(fetched, cutoff, 100);

        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Fresh one", "Fresh two"]);
        assert_eq!(articles[0].keywords, vec!["rust", "kubernetes"]);
        assert_eq!(articles[0].source_name, "Local Feed");
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher(dir.path());
        let ctx = RunContext::new(Utc::now(), 1);
        assert!(fetcher.fetch(&feed_source(), &ctx).await.is_empty());
    }
}
