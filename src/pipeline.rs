//! One daily run: crawl, normalize, summarize, aggregate, publish.
//!
//! ## Stages
//!
//! 1. **Prepare**: the output directory must exist and be writable
//! 2. **Collect**: every source is fetched (a few at a time, results kept in
//!    registry order), deduplicated, validated and capped
//! 3. **Summarize**: each article gets an AI summary; the daily overview and
//!    trending topics are produced concurrently
//! 4. **Publish**: the [`DailyResult`] is written to disk
//!
//! Sources that yield nothing are left out of the result. A run that yields
//! no articles at all publishes nothing.

use crate::api::AskAsync;
use crate::config::{CrawlSettings, OutputSettings};
use crate::context::RunContext;
use crate::error::PipelineError;
use crate::models::{Article, DailyResult, SourceResult};
use crate::normalize::normalize;
use crate::outputs::{self, PublishReport};
use crate::scrapers::Fetcher;
use crate::sources::SourceDescriptor;
use crate::summarizer::Summarizer;
use crate::utils::ensure_writable_dir;
use futures::stream::{self, StreamExt};
use tracing::{Instrument, info, instrument, warn};

/// Sources fetched concurrently.
const SOURCE_CONCURRENCY: usize = 4;

#[derive(Debug)]
pub enum RunOutcome {
    Published { result: DailyResult, report: PublishReport },
    /// Nothing new inside the lookback window; no files were touched.
    NoArticles,
}

/// Normalize one source's fetched articles and cap them.
///
/// Deduplication is per source: the same URL reported by two sources stays
/// in both.
pub fn normalize_source(
    source: &SourceDescriptor,
    fetched: Vec<Article>,
    ctx: &RunContext,
    crawl: &CrawlSettings,
) -> SourceResult {
    let fetched_count = fetched.len();
    let mut articles = normalize(fetched, ctx.cutoff(), crawl.content_min_length);
    let valid = articles.len();
    articles.truncate(crawl.max_articles_per_source);
    info!(source = %source.name, fetched = fetched_count, valid, kept = articles.len(), "Normalized source");
    SourceResult::new(&source.name, &source.url, articles)
}

/// Fetch and normalize every source, dropping those left empty.
#[instrument(level = "info", skip_all, fields(sources = registry.len()))]
pub async fn collect(registry: &[SourceDescriptor], fetcher: &Fetcher, ctx: &RunContext) -> Vec<SourceResult> {
    let results: Vec<SourceResult> = stream::iter(registry)
        .map(|source| async move {
            let fetched = fetcher.fetch(source, ctx).await;
            normalize_source(source, fetched, ctx, fetcher.settings())
        })
        .buffered(SOURCE_CONCURRENCY)
        .collect()
        .await;

    results
        .into_iter()
        .filter(|s| {
            if s.articles.is_empty() {
                info!(source = %s.name, "No new articles from source");
            }
            !s.articles.is_empty()
        })
        .collect()
}

/// Summarize collected sources, aggregate them and publish.
#[instrument(level = "info", skip_all, fields(date = %ctx.date))]
pub async fn process<A: AskAsync>(
    sources: Vec<SourceResult>,
    summarizer: &Summarizer<A>,
    output: &OutputSettings,
    ctx: &RunContext,
) -> Result<RunOutcome, PipelineError> {
    let total: usize = sources.iter().map(|s| s.articles.len()).sum();
    if total == 0 {
        info!("No new articles in the lookback window; skipping publish");
        return Ok(RunOutcome::NoArticles);
    }

    let mut summarized = Vec::with_capacity(sources.len());
    for source in sources {
        let articles = summarizer.summarize_all(source.articles).await;
        summarized.push(SourceResult::new(&source.name, &source.source_url, articles));
    }

    let all: Vec<&Article> = summarized.iter().flat_map(|s| s.articles.iter()).collect();
    let (daily_summary, trending_topics) = tokio::join!(
        summarizer.generate_daily_summary(&all),
        summarizer.extract_trending_topics(&all)
    );
    if daily_summary.is_empty() {
        warn!("Daily summary is empty");
    }

    let result = DailyResult::new(ctx.date, summarized, daily_summary, trending_topics);
    info!(
        total_articles = result.total_article_count,
        sources = result.articles_by_source.len(),
        topics = result.trending_topics.len(),
        unsummarized = result.all_articles().filter(|a| a.ai_summary.is_empty()).count(),
        "Aggregated daily result"
    );

    let report = outputs::publish(&result, output, ctx.now).await?;
    Ok(RunOutcome::Published { result, report })
}

/// Run the whole pipeline for `ctx.date`.
pub async fn run<A: AskAsync>(
    registry: &[SourceDescriptor],
    fetcher: &Fetcher,
    summarizer: &Summarizer<A>,
    output: &OutputSettings,
    ctx: &RunContext,
) -> Result<RunOutcome, PipelineError> {
    async move {
        ensure_writable_dir(&output.output_dir)
            .await
            .map_err(|e| PipelineError::OutputDir {
                path: output.output_dir.display().to_string(),
                reason: e.to_string(),
            })?;

        let sources = collect(registry, fetcher, ctx).await;
        process(sources, summarizer, output, ctx).await
    }
    .instrument(ctx.span.clone())
    .await
}
