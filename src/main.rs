//! # Tech Digest
//!
//! A daily crawler for engineering blogs. It collects the posts published
//! inside a lookback window, summarizes them through a language model, ranks
//! the day's trending topics, and writes a Markdown report, JSON snapshots and
//! cross-run indexes. Slack and Telegram are notified when the digest is out
//! (or when the run fails).
//!
//! ## Features
//!
//! - RSS/Atom feeds, the Dev.to and Naver D2 JSON APIs, and selector-driven
//!   HTML pages, chosen per source from a YAML registry
//! - On-disk body cache keyed by URL hash
//! - OpenAI-compatible or Anthropic models for summaries
//! - `index.json` crawl history and a `README.md` link list, both replaced
//!   per date on re-runs
//!
//! ## Usage
//!
//! ```sh
//! tech_digest -o research/trends -d 1
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: every source is listed and fresh posts get their bodies
//! 2. **Normalizing**: per-source dedupe, validation and capping
//! 3. **Summarizing**: per-article summaries, then the daily overview and
//!    trending topics
//! 4. **Publishing**: report, snapshots and indexes
//! 5. **Notifying**: digest or error report to every configured channel

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod context;
mod error;
mod models;
mod normalize;
mod notify;
mod outputs;
mod pipeline;
mod scrapers;
mod sources;
mod summarizer;
mod utils;

use api::LlmClient;
use cli::Cli;
use config::Settings;
use context::RunContext;
use error::{ErrorReport, PipelineError};
use notify::{Notifiers, Severity, digest_message};
use pipeline::RunOutcome;
use scrapers::{Fetcher, cache::BodyCache};
use sources::{default_registry, load_registry};
use summarizer::Summarizer;

const DIGEST_TITLE: &str = "Daily tech blog digest";
const FAILURE_TITLE: &str = "Tech blog crawl failed";

/// Build every collaborator from `settings` and run the pipeline.
async fn execute(args: &Cli, settings: &Settings, ctx: &RunContext) -> Result<RunOutcome, PipelineError> {
    let registry = match &args.sources {
        Some(path) => load_registry(path).map_err(|e| PipelineError::Config(format!("{}: {e}", path.display())))?,
        None => default_registry(),
    };
    info!(sources = registry.len(), "Loaded source registry");

    let fetcher = Fetcher::new(settings.crawl.clone(), BodyCache::new(&settings.output.cache_dir))
        .map_err(|e| PipelineError::Config(format!("http client: {e}")))?;
    let llm = LlmClient::from_settings(&settings.llm).map_err(|e| PipelineError::Config(format!("llm client: {e}")))?;
    let summarizer = Summarizer::new(llm, settings.summary.clone());

    pipeline::run(&registry, &fetcher, &summarizer, &settings.output, ctx).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "tech_digest starting up");

    let args = Cli::parse();
    debug!(output_dir = %args.output_dir.display(), days_back = args.days_back, "Parsed CLI arguments");
    let settings = Settings::from_cli(&args);
    let notifiers = Notifiers::from_settings(&settings.notify)?;
    let ctx = RunContext::new(Utc::now(), settings.crawl.days_back);

    let outcome = execute(&args, &settings, &ctx).await;
    let elapsed_secs = start_time.elapsed().as_secs_f64();

    match outcome {
        Ok(RunOutcome::Published { result, report }) => {
            info!(
                date = %result.date_key(),
                total_articles = result.total_article_count,
                written = report.written.len(),
                failed = report.failed.len(),
                elapsed_secs,
                "Daily digest published"
            );
            if settings.notify.dry_run {
                info!("Dry run; skipping notifications");
            } else if notifiers.is_empty() {
                debug!("No notification channel configured");
            } else {
                notifiers
                    .broadcast(&digest_message(&result), Some(DIGEST_TITLE), Severity::Good)
                    .await;
            }
            Ok(())
        }
        Ok(RunOutcome::NoArticles) => {
            info!(date = %ctx.date, elapsed_secs, "No new articles; nothing published");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), location = e.location(), elapsed_secs, "Run failed");
            let report = ErrorReport::from_error(&e);
            if !settings.notify.dry_run && !notifiers.is_empty() {
                notifiers
                    .broadcast(&report.to_message(), Some(FAILURE_TITLE), Severity::Danger)
                    .await;
            }
            Err(e.into())
        }
    }
}
