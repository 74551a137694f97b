//! Dev.to (Forem) articles API.
//!
//! `GET /api/articles?per_page=50&top=1` returns the most popular posts of the
//! last day as a JSON array.

use crate::models::Article;
use crate::sources::SourceDescriptor;
use crate::utils::parse_date;
use serde::Deserialize;
use std::error::Error;
use url::Url;

#[derive(Debug, Deserialize)]
struct DevtoArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    published_at: Option<String>,
    description: Option<String>,
    user: Option<DevtoUser>,
    #[serde(default)]
    tag_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct DevtoUser {
    name: Option<String>,
}

/// Listing URL with the query the crawler always uses.
pub fn listing_url(endpoint: &str) -> Result<Url, Box<dyn Error>> {
    Ok(Url::parse_with_params(endpoint, &[("per_page", "50"), ("top", "1")])?)
}

/// Decode a listing response into articles (without bodies).
pub fn decode(json: &str, source: &SourceDescriptor) -> Result<Vec<Article>, Box<dyn Error>> {
    let items: Vec<DevtoArticle> = serde_json::from_str(json)?;
    Ok(items
        .into_iter()
        .map(|item| {
            let mut article = Article::new(&source.name, &source.language, &item.title, &item.url);
            article.published_at = item.published_at.as_deref().and_then(parse_date);
            article.author = item.user.and_then(|u| u.name).filter(|n| !n.is_empty());
            article.summary_raw = item.description.filter(|d| !d.is_empty());
            article.tags = item.tag_list;
            article
        })
        .collect())
}
