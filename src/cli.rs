//! Command-line interface definitions for the tech digest crawler.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Secrets and channel settings can also come from environment variables.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Language model backend used for summaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    /// OpenAI chat-completions API, or any compatible server via `--llm-base-url`.
    Openai,
    /// Anthropic messages API.
    Claude,
}

/// Command-line arguments for the daily crawl.
///
/// # Examples
///
/// ```sh
/// # Crawl the built-in blog list into ./research/trends
/// tech_digest
///
/// # Look back three days, custom registry, no notifications
/// tech_digest -d 3 -s sources.yaml --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory receiving the report, JSON snapshots and indexes
    #[arg(short, long, default_value = "research/trends")]
    pub output_dir: PathBuf,

    /// Directory for the article body cache
    #[arg(long, default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Optional YAML source registry (defaults to the built-in blog list)
    #[arg(short, long)]
    pub sources: Option<PathBuf>,

    /// Lookback window in days (0 to 3650)
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(0..=3650))]
    pub days_back: u32,

    /// Upper bound on articles kept per source
    #[arg(long, default_value_t = 10)]
    pub max_articles_per_source: usize,

    /// Days of history retained in index.json
    #[arg(long, default_value_t = 30)]
    pub history_days: usize,

    /// Language the summaries are written in
    #[arg(long, default_value = "ko")]
    pub summary_language: String,

    #[arg(long, value_enum, default_value_t = LlmProvider::Openai)]
    pub llm_provider: LlmProvider,

    /// Model name; defaults depend on the provider
    #[arg(long)]
    pub llm_model: Option<String>,

    /// Override the API base URL (OpenAI-compatible servers)
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "CLAUDE_API_KEY", hide_env_values = true)]
    pub claude_api_key: Option<String>,

    /// Slack incoming webhook for digests and error reports
    #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
    pub slack_webhook_url: Option<String>,

    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    /// Crawl and publish, but send no notifications
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["tech_digest"]);

        assert_eq!(cli.output_dir, PathBuf::from("research/trends"));
        assert_eq!(cli.cache_dir, PathBuf::from("cache"));
        assert_eq!(cli.days_back, 1);
        assert_eq!(cli.max_articles_per_source, 10);
        assert_eq!(cli.history_days, 30);
        assert_eq!(cli.llm_provider, LlmProvider::Openai);
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "tech_digest",
            "-o",
            "/tmp/trends",
            "-d",
            "3",
            "-s",
            "sources.yaml",
            "--llm-provider",
            "claude",
            "--dry-run",
        ]);

        assert_eq!(cli.output_dir, PathBuf::from("/tmp/trends"));
        assert_eq!(cli.days_back, 3);
        assert_eq!(cli.sources, Some(PathBuf::from("sources.yaml")));
        assert_eq!(cli.llm_provider, LlmProvider::Claude);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_days_back_out_of_range_is_rejected() {
        assert!(Cli::try_parse_from(["tech_digest", "-d", "200000000"]).is_err());
        assert_eq!(Cli::try_parse_from(["tech_digest", "-d", "3650"]).unwrap().days_back, 3650);
    }
}
