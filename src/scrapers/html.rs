//! Selector-driven extraction from HTML pages.
//!
//! Used for listing pages of `html` sources and, for every strategy, for
//! pulling the article body out of the post page.

use crate::models::Article;
use crate::sources::{FieldSelectors, SourceDescriptor};
use crate::utils::{collapse_whitespace, parse_date};
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use url::Url;

fn selector(css: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(css).map_err(|e| format!("invalid selector '{css}': {e}").into())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_in<'a>(scope: ElementRef<'a>, css: Option<&str>) -> Result<Option<ElementRef<'a>>, Box<dyn Error>> {
    match css {
        Some(css) => Ok(scope.select(&selector(css)?).next()),
        None => Ok(None),
    }
}

fn href_of(el: ElementRef<'_>) -> Option<String> {
    if let Some(href) = el.value().attr("href") {
        return Some(href.to_string());
    }
    let anchor = Selector::parse("a[href]").ok()?;
    el.select(&anchor)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

fn parse_item(
    item: ElementRef<'_>,
    selectors: &FieldSelectors,
    base: &Url,
    source: &SourceDescriptor,
) -> Result<Option<Article>, Box<dyn Error>> {
    let Some(title_el) = first_in(item, selectors.title.as_deref())? else {
        return Ok(None);
    };
    let link_el = first_in(item, selectors.link.as_deref())?.unwrap_or(title_el);
    let Some(href) = href_of(link_el).or_else(|| href_of(item)) else {
        return Ok(None);
    };
    let Ok(url) = base.join(&href) else {
        return Ok(None);
    };

    let mut article = Article::new(&source.name, &source.language, &element_text(title_el), url.as_str());
    if let Some(date_el) = first_in(item, selectors.date.as_deref())? {
        article.published_at = date_el
            .value()
            .attr("datetime")
            .and_then(parse_date)
            .or_else(|| parse_date(&element_text(date_el)));
    }
    article.author = first_in(item, selectors.author.as_deref())?
        .map(element_text)
        .filter(|a| !a.is_empty());
    if let Some(tags) = selectors.tags.as_deref() {
        article.tags = item.select(&selector(tags)?).map(element_text).collect();
    }
    Ok(Some(article))
}

/// Extract posts from a listing page.
///
/// Each element matching `selectors.item` is one post (the whole page when no
/// item selector is configured). Links are resolved against `page_url`.
pub fn parse_listing(html: &str, page_url: &str, source: &SourceDescriptor) -> Result<Vec<Article>, Box<dyn Error>> {
    let base = Url::parse(page_url)?;
    let document = Html::parse_document(html);
    let selectors = &source.selectors;
    if selectors.title.is_none() {
        return Err(format!("html source '{}' has no title selector", source.name).into());
    }

    let items: Vec<ElementRef<'_>> = match selectors.item.as_deref() {
        Some(css) => document.select(&selector(css)?).collect(),
        None => vec![document.root_element()],
    };

    let mut articles = Vec::new();
    for item in items {
        if let Some(article) = parse_item(item, selectors, &base, source)? {
            articles.push(article);
        }
    }
    Ok(articles)
}

/// Body text of a post page: text of the first element, across the candidate
/// selectors in order, that has any. Invalid selectors are skipped.
pub fn extract_body(html: &str, candidates: &[String]) -> Option<String> {
    let document = Html::parse_document(html);
    candidates
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|sel| {
            document
                .select(&sel)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{FetchStrategy, OneOrMany};
    use chrono::{TimeZone, Utc};

    fn blog_source() -> SourceDescriptor {
        SourceDescriptor {
            name: "Example Blog".to_string(),
            url: "https://blog.example.com/".to_string(),
            strategy: FetchStrategy::Html,
            rss_feed: None,
            api_endpoint: None,
            api_adapter: None,
            selectors: FieldSelectors {
                item: Some(".post".to_string()),
                title: Some("h2 a".to_string()),
                date: Some("time".to_string()),
                author: Some(".author".to_string()),
                tags: Some(".tag".to_string()),
                content: OneOrMany::One(".entry".to_string()),
                ..FieldSelectors::default()
            },
            language: "en".to_string(),
            description: String::new(),
        }
    }

    const LISTING: &str = r#"<html><body>
      <div class="post">
        <h2><a href="/2025/05/rust-at-work">Rust   at work</a></h2>
        <time datetime="2025-05-06T10:00:00+09:00">May 6</time>
        <span class="author">Park</span>
        <a class="tag">rust</a><a class="tag">backend</a>
      </div>
      <div class="post">
        <h2><a href="https://other.example.com/p/2">Second</a></h2>
        <time>2025-05-05</time>
      </div>
      <div class="post"><p>no title here</p></div>
    </body></html>"#;

    #[test]
    fn test_parse_listing_items() {
        let source = blog_source();
        let articles = parse_listing(LISTING, &source.url, &source).unwrap();
        assert_eq!(articles.len(), 2);

        let a = &articles[0];
        assert_eq!(a.title, "Rust at work");
        assert_eq!(a.url, "https://blog.example.com/2025/05/rust-at-work");
        assert_eq!(a.published_at, Some(Utc.with_ymd_and_hms(2025, 5, 6, 1, 0, 0).unwrap()));
        assert_eq!(a.author.as_deref(), Some("Park"));
        assert_eq!(a.tags, vec!["rust", "backend"]);

        assert_eq!(articles[1].url, "https://other.example.com/p/2");
        assert_eq!(articles[1].published_at, Some(Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap()));
        assert_eq!(articles[1].author, None);
    }

    #[test]
    fn test_parse_listing_rejects_bad_selector() {
        let mut source = blog_source();
        source.selectors.item = Some("div[".to_string());
        assert!(parse_listing(LISTING, &source.url, &source).is_err());
    }

    #[test]
    fn test_extract_body_uses_first_matching_candidate() {
        let page = r#"<html><body>
          <div class="content">   </div>
          <article><p>First paragraph.</p>
          <p>Second   paragraph.</p></article>
          <div class="post-content">fallback</div>
        </body></html>"#;

        let candidates = vec![".missing".to_string(), "article".to_string(), ".post-content".to_string()];
        assert_eq!(
            extract_body(page, &candidates).as_deref(),
            Some("First paragraph. Second paragraph.")
        );

        let only_empty = vec![".content".to_string()];
        assert_eq!(extract_body(page, &only_empty), None);

        let invalid_first = vec!["[[".to_string(), ".post-content".to_string()];
        assert_eq!(extract_body(page, &invalid_first).as_deref(), Some("fallback"));
    }
}
