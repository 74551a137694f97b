//! Per-article summaries, the daily overview, and trending topics.
//!
//! Every method degrades instead of failing: a model error becomes an empty
//! string (or empty descriptions), is logged, and the run carries on.

use crate::api::AskAsync;
use crate::config::SummarySettings;
use crate::models::{Article, TrendingTopic};
use crate::utils::{looks_truncated, truncate_chars, truncate_for_log};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Concurrent article summaries in flight.
const PARALLEL_BATCH_SIZE: usize = 8;
/// Body chars included in an article prompt.
const PROMPT_BODY_CHARS: usize = 4000;

fn language_name(code: &str) -> &str {
    match code {
        "ko" => "Korean",
        "en" => "English",
        "ja" => "Japanese",
        other => other,
    }
}

/// Count topics across articles, once per article, ranked by count with
/// first-seen order breaking ties. Topics are article keywords and tags,
/// lowercased.
pub fn rank_topics<'a>(articles: impl IntoIterator<Item = &'a Article>, max: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for article in articles {
        let mut seen_here = Vec::new();
        for topic in article.keywords.iter().chain(article.tags.iter()) {
            let topic = topic.trim().to_lowercase();
            if topic.is_empty() || seen_here.contains(&topic) {
                continue;
            }
            match index.get(&topic) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    index.insert(topic.clone(), counts.len());
                    counts.push((topic.clone(), 1));
                }
            }
            seen_here.push(topic);
        }
    }

    // sort_by is stable, so equal counts keep first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(max);
    counts
}

/// Pull the first `{ ... }` object out of a model reply, tolerating code fences.
fn json_object_slice(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

pub struct Summarizer<A> {
    llm: A,
    settings: SummarySettings,
}

impl<A: AskAsync> Summarizer<A> {
    pub fn new(llm: A, settings: SummarySettings) -> Self {
        Self { llm, settings }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a senior software engineer writing a daily digest of engineering blog posts. \
             Answer in {}. Be factual and concise. Do not invent details that are not in the input.",
            language_name(&self.settings.language)
        )
    }

    /// Summary of one article, at most `max_summary_chars` characters.
    /// Empty when the model call fails.
    #[instrument(level = "info", skip_all, fields(url = %article.url))]
    pub async fn summarize_article(&self, article: &Article) -> String {
        let body = article.body.as_deref().unwrap_or_default();
        let prompt = format!(
            "Summarize this blog post in 2-3 sentences (max {} characters). \
             Focus on the technical problem, the approach, and the takeaway.\n\n\
             Title: {}\nSource: {}\nDescription: {}\n\nContent:\n{}",
            self.settings.max_summary_chars,
            article.title,
            article.source_name,
            article.summary_raw.as_deref().unwrap_or("-"),
            truncate_chars(body, PROMPT_BODY_CHARS),
        );

        match self.llm.ask(&self.system_prompt(), &prompt).await {
            Ok(reply) => truncate_chars(reply.trim(), self.settings.max_summary_chars),
            Err(e) => {
                warn!(error = %e, "Article summary failed; leaving it empty");
                String::new()
            }
        }
    }

    /// Fill `ai_summary` on every article, keeping their order.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize_all(&self, articles: Vec<Article>) -> Vec<Article> {
        let summarized: Vec<Article> = stream::iter(articles)
            .map(|mut article| async move {
                article.ai_summary = self.summarize_article(&article).await;
                article
            })
            .buffered(PARALLEL_BATCH_SIZE)
            .collect()
            .await;

        let empty = summarized.iter().filter(|a| a.ai_summary.is_empty()).count();
        info!(total = summarized.len(), empty, "Summarized articles");
        summarized
    }

    /// One overview paragraph across all of the day's articles.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn generate_daily_summary(&self, articles: &[&Article]) -> String {
        if articles.is_empty() {
            return String::new();
        }
        let listing = articles
            .iter()
            .map(|a| {
                let gist = if a.ai_summary.is_empty() {
                    a.summary_raw.as_deref().unwrap_or_default()
                } else {
                    a.ai_summary.as_str()
                };
                format!("- [{}] {}: {}", a.source_name, a.title, truncate_chars(gist, 300))
            })
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "Here are today's engineering blog posts. Write a short overview (one or two paragraphs) \
             of the main themes and the most notable posts.\n\n{listing}"
        );

        match self.llm.ask(&self.system_prompt(), &prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Daily summary failed; leaving it empty");
                String::new()
            }
        }
    }

    /// The most mentioned topics with a one-line description each.
    ///
    /// Ranking is computed locally, so the topics survive a model failure;
    /// only their descriptions are left empty.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn extract_trending_topics(&self, articles: &[&Article]) -> Vec<TrendingTopic> {
        let ranked = rank_topics(articles.iter().copied(), self.settings.trending_topics_count);
        if ranked.is_empty() {
            return Vec::new();
        }

        let titles = articles
            .iter()
            .map(|a| format!("- {}", a.title))
            .collect::<Vec<_>>()
            .join("\n");
        let topic_list = ranked
            .iter()
            .map(|(t, c)| format!("- {t} ({c} posts)"))
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!(
            "These topics trended in today's engineering blog posts:\n{topic_list}\n\n\
             Post titles:\n{titles}\n\n\
             Reply with ONLY a JSON object mapping each topic (exactly as written) \
             to a one-sentence description of how it appeared today."
        );

        let descriptions: HashMap<String, String> = match self.llm.ask(&self.system_prompt(), &prompt).await {
            Ok(reply) => match json_object_slice(&reply).map(serde_json::from_str::<HashMap<String, String>>) {
                Some(Ok(map)) => map,
                Some(Err(e)) => {
                    warn!(
                        error = %e,
                        truncated = looks_truncated(&e),
                        reply = %truncate_for_log(&reply, 300),
                        "Trending topic descriptions were not valid JSON"
                    );
                    HashMap::new()
                }
                None => {
                    warn!(reply = %truncate_for_log(&reply, 300), "No JSON object in trending topic reply");
                    HashMap::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Trending topic descriptions failed; leaving them empty");
                HashMap::new()
            }
        };

        ranked
            .into_iter()
            .map(|(topic, count)| TrendingTopic {
                description: descriptions.get(&topic).cloned().unwrap_or_default(),
                topic,
                count,
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every prompt with a fixed reply.
    pub(crate) struct FixedLlm(pub String);

    impl AskAsync for FixedLlm {
        async fn ask(&self, _system: &str, _prompt: &str) -> Result<String, Box<dyn Error>> {
            Ok(self.0.clone())
        }
    }

    /// Fails whenever the prompt mentions `poison`; otherwise echoes a summary.
    pub(crate) struct FlakyLlm {
        pub poison: String,
        pub calls: AtomicUsize,
    }

    impl AskAsync for FlakyLlm {
        async fn ask(&self, _system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt.contains(&self.poison) {
                return Err("timed out".into());
            }
            if prompt.contains("JSON object") {
                return Ok("```json\n{\"rust\": \"Rust everywhere\"}\n```".to_string());
            }
            Ok("  A concise summary.  ".to_string())
        }
    }

    fn article(title: &str, keywords: &[&str]) -> Article {
        let mut a = Article::new("Blog", "en", title, &format!("https://b.dev/{title}"));
        a.keywords = keywords.iter().map(|k| k.to_string()).collect();
        a.body = Some("body".repeat(50));
        a
    }

    fn settings() -> SummarySettings {
        SummarySettings {
            language: "en".to_string(),
            ..SummarySettings::default()
        }
    }

    #[test]
    fn test_rank_topics_counts_once_per_article_and_breaks_ties_by_first_seen() {
        let mut tagged = article("c", &["docker"]);
        tagged.tags = vec!["Rust".to_string(), "rust".to_string()];
        let articles = vec![
            article("a", &["kafka", "rust"]),
            article("b", &["docker", "rust", "rust"]),
            tagged,
        ];
        let ranked = rank_topics(&articles, 10);
        assert_eq!(
            ranked,
            vec![("rust".to_string(), 3), ("docker".to_string(), 2), ("kafka".to_string(), 1)]
        );

        let capped = rank_topics(&articles, 2);
        assert_eq!(capped.len(), 2);

        let tie = vec![article("x", &["golang", "aws"]), article("y", &["aws", "golang"])];
        assert_eq!(rank_topics(&tie, 10)[0].0, "golang");
    }

    #[tokio::test]
    async fn test_summary_is_trimmed_and_capped() {
        let summarizer = Summarizer::new(
            FixedLlm("x".repeat(1000)),
            SummarySettings {
                max_summary_chars: 50,
                ..settings()
            },
        );
        let summary = summarizer.summarize_article(&article("a", &[])).await;
        assert_eq!(summary.chars().count(), 53);
        assert!(summary.ends_with("..."));
    }

    #[tokio::test]
    async fn test_failed_article_keeps_empty_summary() {
        let llm = FlakyLlm {
            poison: "Broken post".to_string(),
            calls: AtomicUsize::new(0),
        };
        let summarizer = Summarizer::new(llm, settings());
        let out = summarizer
            .summarize_all(vec![article("Good post", &[]), article("Broken post", &[]), article("Fine post", &[])])
            .await;

        let titles: Vec<&str> = out.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Good post", "Broken post", "Fine post"]);
        assert_eq!(out[0].ai_summary, "A concise summary.");
        assert_eq!(out[1].ai_summary, "");
        assert_eq!(out[2].ai_summary, "A concise summary.");
    }

    #[tokio::test]
    async fn test_trending_topics_parse_fenced_json() {
        let llm = FlakyLlm {
            poison: "never".to_string(),
            calls: AtomicUsize::new(0),
        };
        let summarizer = Summarizer::new(llm, settings());
        let a = article("a", &["rust", "kafka"]);
        let b = article("b", &["rust"]);
        let topics = summarizer.extract_trending_topics(&[&a, &b]).await;

        assert_eq!(topics.len(), 2);
        assert_eq!(topics[0].topic, "rust");
        assert_eq!(topics[0].count, 2);
        assert_eq!(topics[0].description, "Rust everywhere");
        assert_eq!(topics[1].description, "");
    }

    #[tokio::test]
    async fn test_trending_topics_survive_llm_failure() {
        let llm = FlakyLlm {
            poison: "trended".to_string(),
            calls: AtomicUsize::new(0),
        };
        let summarizer = Summarizer::new(llm, settings());
        let a = article("a", &["rust"]);
        let topics = summarizer.extract_trending_topics(&[&a]).await;
        assert_eq!(topics, vec![TrendingTopic { topic: "rust".to_string(), count: 1, description: String::new() }]);
    }

    #[tokio::test]
    async fn test_daily_summary_skips_call_for_no_articles() {
        let llm = FlakyLlm {
            poison: "never".to_string(),
            calls: AtomicUsize::new(0),
        };
        let summarizer = Summarizer::new(llm, settings());
        assert_eq!(summarizer.generate_daily_summary(&[]).await, "");
        assert!(summarizer.extract_trending_topics(&[]).await.is_empty());
        assert_eq!(summarizer.llm.calls.load(Ordering::SeqCst), 0);

        let a = article("a", &[]);
        assert_eq!(summarizer.generate_daily_summary(&[&a]).await, "A concise summary.");
    }

    #[test]
    fn test_json_object_slice() {
        assert_eq!(json_object_slice("```json\n{\"a\":\"b\"}\n```"), Some("{\"a\":\"b\"}"));
        assert_eq!(json_object_slice("no json"), None);
    }
}
