//! Deduplication and validation of one source's articles.
//!
//! Pure functions over `Vec<Article>`: no I/O and no clock access (the cutoff
//! comes from the caller's [`crate::context::RunContext`]).

use crate::models::Article;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use tracing::debug;

/// Keep the first article for every URL, preserving order.
pub fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    articles.into_iter().unique_by(|a| a.url.clone()).collect()
}

/// Why an article was rejected by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingTitle,
    MissingUrl,
    BodyTooShort,
    UnknownDate,
    Stale,
}

/// Check one article against the validation rules, in order.
pub fn check(article: &Article, cutoff: DateTime<Utc>, min_body_chars: usize) -> Result<(), Rejection> {
    if article.title.trim().is_empty() {
        return Err(Rejection::MissingTitle);
    }
    if article.url.trim().is_empty() {
        return Err(Rejection::MissingUrl);
    }
    // `summary_raw` never counts towards the body length.
    if article.body_len() < min_body_chars {
        return Err(Rejection::BodyTooShort);
    }
    match article.published_at {
        None => Err(Rejection::UnknownDate),
        Some(published) if published < cutoff => Err(Rejection::Stale),
        Some(_) => Ok(()),
    }
}

/// Drop articles failing [`check`].
pub fn validate(articles: Vec<Article>, cutoff: DateTime<Utc>, min_body_chars: usize) -> Vec<Article> {
    articles
        .into_iter()
        .filter(|a| match check(a, cutoff, min_body_chars) {
            Ok(()) => true,
            Err(reason) => {
                debug!(url = %a.url, ?reason, "Dropping article");
                false
            }
        })
        .collect()
}

/// Dedupe then validate.
pub fn normalize(articles: Vec<Article>, cutoff: DateTime<Utc>, min_body_chars: usize) -> Vec<Article> {
    validate(dedupe(articles), cutoff, min_body_chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn article(url: &str, title: &str, age_hours: i64, body_len: usize) -> Article {
        let mut a = Article::new("Blog", "en", title, url);
        a.published_at = Some(now() - Duration::hours(age_hours));
        a.body = Some("x".repeat(body_len));
        a
    }

    #[test]
    fn test_dedupe_first_occurrence_wins() {
        let mut first = article("https://b.dev/1", "first", 1, 200);
        first.author = Some("a".to_string());
        let input = vec![
            first.clone(),
            article("https://b.dev/2", "two", 1, 200),
            article("https://b.dev/1", "dup", 2, 200),
        ];
        let out = dedupe(input);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], first);
        assert_eq!(out[1].url, "https://b.dev/2");
    }

    #[test]
    fn test_dedupe_is_idempotent_over_concatenation() {
        let list = vec![
            article("https://b.dev/1", "one", 1, 200),
            article("https://b.dev/2", "two", 1, 200),
            article("https://b.dev/1", "one again", 1, 200),
        ];
        let once = normalize(list.clone(), now() - Duration::days(1), 100);
        let doubled: Vec<Article> = list.iter().cloned().chain(list.iter().cloned()).collect();
        let twice = normalize(doubled, now() - Duration::days(1), 100);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_validate_rejections() {
        let cutoff = now() - Duration::days(1);
        assert_eq!(check(&article("https://b.dev/1", "  ", 1, 200), cutoff, 100), Err(Rejection::MissingTitle));
        assert_eq!(check(&article("", "t", 1, 200), cutoff, 100), Err(Rejection::MissingUrl));
        assert_eq!(check(&article("https://b.dev/1", "t", 1, 99), cutoff, 100), Err(Rejection::BodyTooShort));
        assert_eq!(check(&article("https://b.dev/1", "t", 25, 200), cutoff, 100), Err(Rejection::Stale));

        let mut undated = article("https://b.dev/1", "t", 1, 200);
        undated.published_at = None;
        assert_eq!(check(&undated, cutoff, 100), Err(Rejection::UnknownDate));

        assert_eq!(check(&article("https://b.dev/1", "t", 23, 100), cutoff, 100), Ok(()));
    }

    #[test]
    fn test_summary_raw_does_not_replace_body() {
        let mut a = article("https://b.dev/1", "t", 1, 0);
        a.body = None;
        a.summary_raw = Some("y".repeat(500));
        assert!(validate(vec![a], now() - Duration::days(1), 100).is_empty());
    }

    #[test]
    fn test_no_stale_article_survives_any_lookback() {
        let articles: Vec<Article> = (0..72)
            .map(|h| article(&format!("https://b.dev/{h}"), "t", h, 150))
            .collect();
        for lookback_hours in [0, 1, 12, 24, 48, 100] {
            let cutoff = now() - Duration::hours(lookback_hours);
            let out = normalize(articles.clone(), cutoff, 100);
            assert!(out.iter().all(|a| a.published_at.unwrap() >= cutoff));
            assert_eq!(out.len(), (lookback_hours.min(71) + 1) as usize);
        }
    }
}
