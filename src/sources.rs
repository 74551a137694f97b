//! Source registry: which blogs to crawl and how.
//!
//! Each [`SourceDescriptor`] carries an explicit [`FetchStrategy`] tag plus the
//! strategy-specific settings the fetcher needs. Sources are selected by tag
//! lookup, never by comparing their names, so adding a blog is a configuration
//! change only.
//!
//! The registry is either the built-in [`default_registry`] or a YAML file:
//!
//! ```yaml
//! - name: Dev.to
//!   url: https://dev.to/
//!   type: api
//!   api_endpoint: https://dev.to/api/articles
//!   api_adapter: devto
//!   language: en
//!   selectors:
//!     content: ".crayons-article__main"
//! ```

use crate::utils::file_slug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// How a source's listing is retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Rss,
    Api,
    Html,
}

/// Decoder for a source-specific REST API. Every distinct response shape gets one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiAdapter {
    /// `GET /api/articles` on dev.to (Forem).
    Devto,
    /// `GET /api/v1/contents` on d2.naver.com.
    NaverD2,
}

/// One selector or an ordered list of candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }
}

fn default_content_selectors() -> OneOrMany {
    OneOrMany::Many(vec![
        "article".to_string(),
        ".content".to_string(),
        ".post-content".to_string(),
    ])
}

/// CSS selectors for each logical field of a post.
///
/// `content` is used when fetching article bodies; the remaining fields only
/// matter for [`FetchStrategy::Html`] listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelectors {
    /// Container for one post on a listing page. When absent the whole page is one item.
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Element carrying the post link; defaults to the title element or its first `a[href]`.
    #[serde(default)]
    pub link: Option<String>,
    /// Body candidates, tried in order; the first match wins.
    #[serde(default = "default_content_selectors")]
    pub content: OneOrMany,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

impl Default for FieldSelectors {
    fn default() -> Self {
        Self {
            item: None,
            title: None,
            link: None,
            content: default_content_selectors(),
            author: None,
            date: None,
            tags: None,
        }
    }
}

/// Static description of a blog. Never mutated after the registry is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Unique key; used in reports and per-source file names.
    pub name: String,
    /// Home page. Also the listing page for [`FetchStrategy::Html`].
    pub url: String,
    #[serde(rename = "type")]
    pub strategy: FetchStrategy,
    /// Feed URL. An `html` source with a feed defers to it.
    #[serde(default)]
    pub rss_feed: Option<String>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub api_adapter: Option<ApiAdapter>,
    #[serde(default)]
    pub selectors: FieldSelectors,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub description: String,
}

fn default_language() -> String {
    "en".to_string()
}

impl SourceDescriptor {
    /// The strategy actually used for this source: an `html` source that
    /// also lists a feed is fetched through the feed.
    pub fn effective_strategy(&self) -> FetchStrategy {
        match (self.strategy, &self.rss_feed) {
            (FetchStrategy::Html, Some(_)) => FetchStrategy::Rss,
            (s, _) => s,
        }
    }

    /// URL requested for the listing under [`Self::effective_strategy`].
    pub fn endpoint(&self) -> Option<&str> {
        match self.effective_strategy() {
            FetchStrategy::Rss => self.rss_feed.as_deref(),
            FetchStrategy::Api => self.api_endpoint.as_deref(),
            FetchStrategy::Html => Some(self.url.as_str()),
        }
    }

    /// Body selectors in priority order.
    pub fn content_selectors(&self) -> Vec<String> {
        self.selectors.content.to_vec()
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("source with empty name".to_string());
        }
        if self.endpoint().is_none() {
            return Err(format!(
                "source '{}' has type {:?} but no endpoint for it",
                self.name, self.strategy
            ));
        }
        if self.strategy == FetchStrategy::Api && self.api_adapter.is_none() {
            return Err(format!("source '{}' has type api but no api_adapter", self.name));
        }
        Ok(())
    }
}

/// Check a registry: every source valid, names unique, and no two names
/// mapping to the same per-source output file.
pub fn validate_registry(sources: &[SourceDescriptor]) -> Result<(), Box<dyn Error>> {
    let mut seen = HashSet::new();
    let mut slugs: HashMap<String, &str> = HashMap::new();
    for source in sources {
        source.validate()?;
        if !seen.insert(source.name.as_str()) {
            return Err(format!("duplicate source name '{}'", source.name).into());
        }
        if let Some(other) = slugs.insert(file_slug(&source.name), &source.name) {
            return Err(format!(
                "sources '{other}' and '{}' would write the same output file",
                source.name
            )
            .into());
        }
    }
    Ok(())
}

/// Load and validate a YAML registry file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_registry(path: &Path) -> Result<Vec<SourceDescriptor>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let sources: Vec<SourceDescriptor> = serde_yaml::from_str(&raw)?;
    validate_registry(&sources)?;
    info!(count = sources.len(), "Loaded source registry");
    Ok(sources)
}

fn sel(s: &str) -> Option<String> {
    Some(s.to_string())
}

/// The engineering blogs crawled when no registry file is given.
pub fn default_registry() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor {
            name: "Hacker News".to_string(),
            url: "https://news.ycombinator.com/".to_string(),
            strategy: FetchStrategy::Html,
            rss_feed: sel("https://hnrss.org/frontpage"),
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                item: sel("tr.athing"),
                title: sel(".titleline > a"),
                link: sel(".titleline > a"),
                ..FieldSelectors::default()
            },
            language: "en".to_string(),
            description: "Hot topics from the developer community".to_string(),
        },
        SourceDescriptor {
            name: "Dev.to".to_string(),
            url: "https://dev.to/".to_string(),
            strategy: FetchStrategy::Api,
            rss_feed: None,
            api_endpoint: sel("https://dev.to/api/articles"),
            api_adapter: Some(ApiAdapter::Devto),
            selectors: FieldSelectors {
                title: sel("h1"),
                content: OneOrMany::One(".crayons-article__main".to_string()),
                author: sel(".crayons-story__secondary .crayons-link"),
                tags: sel(".crayons-tag"),
                ..FieldSelectors::default()
            },
            language: "en".to_string(),
            description: "Developer blogging platform".to_string(),
        },
        SourceDescriptor {
            name: "Medium Engineering".to_string(),
            url: "https://medium.engineering/".to_string(),
            strategy: FetchStrategy::Rss,
            rss_feed: sel("https://medium.com/feed/engineering-at-meta"),
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                title: sel("h1"),
                content: OneOrMany::One("article section".to_string()),
                author: sel(".author-name"),
                ..FieldSelectors::default()
            },
            language: "en".to_string(),
            description: "Engineering posts published on Medium".to_string(),
        },
        SourceDescriptor {
            name: "Kakao Tech".to_string(),
            url: "https://tech.kakao.com/".to_string(),
            strategy: FetchStrategy::Rss,
            rss_feed: sel("https://tech.kakao.com/feed/"),
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                title: sel(".post-title"),
                content: OneOrMany::One(".post-content".to_string()),
                author: sel(".post-author"),
                date: sel(".post-date"),
                ..FieldSelectors::default()
            },
            language: "ko".to_string(),
            description: "Kakao engineering and service stories".to_string(),
        },
        SourceDescriptor {
            name: "Woowahan Tech".to_string(),
            url: "https://techblog.woowahan.com/".to_string(),
            strategy: FetchStrategy::Rss,
            rss_feed: sel("https://techblog.woowahan.com/feed/"),
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                title: sel(".entry-title"),
                content: OneOrMany::One(".entry-content".to_string()),
                author: sel(".author-name"),
                ..FieldSelectors::default()
            },
            language: "ko".to_string(),
            description: "Baemin engineering blog".to_string(),
        },
        SourceDescriptor {
            name: "Naver D2".to_string(),
            url: "https://d2.naver.com/".to_string(),
            strategy: FetchStrategy::Api,
            rss_feed: None,
            api_endpoint: sel("https://d2.naver.com/api/v1/contents"),
            api_adapter: Some(ApiAdapter::NaverD2),
            selectors: FieldSelectors {
                title: sel(".post_title"),
                content: OneOrMany::Many(vec![".post_content".to_string(), ".con_view".to_string()]),
                author: sel(".post_author"),
                tags: sel(".post_tag"),
                ..FieldSelectors::default()
            },
            language: "ko".to_string(),
            description: "Naver engineering and service stories".to_string(),
        },
    ]
}
