//! Naver D2 contents API.
//!
//! `GET /api/v1/contents?page=0&size=20` returns a page object whose
//! `content` array holds posts with site-relative URLs and epoch-millisecond
//! publish times.

use crate::models::Article;
use crate::sources::SourceDescriptor;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::error::Error;
use url::Url;

#[derive(Debug, Deserialize)]
struct ContentsPage {
    #[serde(default)]
    content: Vec<D2Post>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct D2Post {
    #[serde(default)]
    post_title: String,
    #[serde(default)]
    url: String,
    post_published_at: Option<i64>,
    author: Option<String>,
    post_description: Option<String>,
}

pub fn listing_url(endpoint: &str) -> Result<Url, Box<dyn Error>> {
    Ok(Url::parse_with_params(endpoint, &[("page", "0"), ("size", "20")])?)
}

/// Decode a contents page. Relative post URLs are resolved against the source home page.
pub fn decode(json: &str, source: &SourceDescriptor) -> Result<Vec<Article>, Box<dyn Error>> {
    let page: ContentsPage = serde_json::from_str(json)?;
    let base = Url::parse(&source.url)?;

    Ok(page
        .content
        .into_iter()
        .map(|post| {
            let link = base
                .join(&post.url)
                .map(|u| u.to_string())
                .unwrap_or(post.url);
            let mut article = Article::new(&source.name, &source.language, &post.post_title, &link);
            article.published_at = post.post_published_at.and_then(DateTime::<Utc>::from_timestamp_millis);
            article.author = post.author.filter(|a| !a.is_empty());
            article.summary_raw = post.post_description.filter(|d| !d.is_empty());
            article
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::default_registry;
    use chrono::TimeZone;

    #[test]
    fn test_decode_d2_page() {
        let source = &default_registry()[5];
        let json = r#"{
          "content": [
            {"postTitle": "대규모 Kafka 운영기", "url": "/helloworld/1234567", "postPublishedAt": 1746489600000, "author": "네이버"},
            {"postTitle": "Absolute", "url": "https://d2.naver.com/news/42"}
          ],
          "totalPages": 10
        }"#;
        let articles = decode(json, source).unwrap();
        assert_eq!(articles.len(), 2);

        assert_eq!(articles[0].title, "대규모 Kafka 운영기");
        assert_eq!(articles[0].url, "https://d2.naver.com/helloworld/1234567");
        assert_eq!(articles[0].published_at, Some(Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap()));
        assert_eq!(articles[0].author.as_deref(), Some("네이버"));

        assert_eq!(articles[1].url, "https://d2.naver.com/news/42");
        assert_eq!(articles[1].published_at, None);
    }

    #[test]
    fn test_empty_page() {
        let source = &default_registry()[5];
        assert!(decode("{}", source).unwrap().is_empty());
    }
}
