//! Typed settings for each pipeline stage, derived from the [`Cli`].

use crate::cli::{Cli, LlmProvider};
use std::path::PathBuf;
use std::time::Duration;

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Fetching and validation knobs.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub days_back: u32,
    /// Per-request ceiling for every HTTP fetch.
    pub timeout: Duration,
    pub user_agent: String,
    pub max_articles_per_source: usize,
    /// Bodies shorter than this (in chars) are treated as noise.
    pub content_min_length: usize,
    /// Bodies are cut to this many chars before caching.
    pub max_body_chars: usize,
    pub keywords_per_article: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            days_back: 1,
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
            max_articles_per_source: 10,
            content_min_length: 100,
            max_body_chars: 5000,
            keywords_per_article: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummarySettings {
    pub max_summary_chars: usize,
    pub trending_topics_count: usize,
    /// Language code the model is asked to answer in (`ko`, `en`, ...).
    pub language: String,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            max_summary_chars: 300,
            trending_topics_count: 10,
            language: "ko".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputSettings {
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    /// Entries kept in `index.json`.
    pub history_days: usize,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl LlmSettings {
    fn from_cli(cli: &Cli) -> Self {
        let (model, base_url, api_key) = match cli.llm_provider {
            LlmProvider::Openai => (
                "gpt-4o-mini",
                "https://api.openai.com/v1",
                cli.openai_api_key.clone(),
            ),
            LlmProvider::Claude => (
                "claude-3-haiku-20240307",
                "https://api.anthropic.com/v1",
                cli.claude_api_key.clone(),
            ),
        };
        Self {
            provider: cli.llm_provider,
            model: cli.llm_model.clone().unwrap_or_else(|| model.to_string()),
            base_url: cli
                .llm_base_url
                .clone()
                .unwrap_or_else(|| base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_tokens: 1000,
            temperature: 0.3,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NotifySettings {
    pub slack_webhook_url: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub dry_run: bool,
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub crawl: CrawlSettings,
    pub summary: SummarySettings,
    pub output: OutputSettings,
    pub llm: LlmSettings,
    pub notify: NotifySettings,
}

impl Settings {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            crawl: CrawlSettings {
                days_back: cli.days_back,
                max_articles_per_source: cli.max_articles_per_source,
                ..CrawlSettings::default()
            },
            summary: SummarySettings {
                language: cli.summary_language.clone(),
                ..SummarySettings::default()
            },
            output: OutputSettings {
                output_dir: cli.output_dir.clone(),
                cache_dir: cli.cache_dir.clone(),
                history_days: cli.history_days.max(1),
            },
            llm: LlmSettings::from_cli(cli),
            notify: NotifySettings {
                slack_webhook_url: cli.slack_webhook_url.clone(),
                telegram_bot_token: cli.telegram_bot_token.clone(),
                telegram_chat_id: cli.telegram_chat_id.clone(),
                dry_run: cli.dry_run,
            },
        }
    }
}
