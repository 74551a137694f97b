//! RSS 2.0 and Atom feed parsing.
//!
//! Uses the quick-xml event reader directly so one pass handles both formats
//! and the common extensions (`dc:creator`, `dc:date`, `content:encoded`).

use crate::models::Article;
use crate::sources::SourceDescriptor;
use crate::utils::{parse_date, strip_html};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::error::Error;

/// One entry as it appears in the feed, before any interpretation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
}

impl FeedEntry {
    /// Convert into an [`Article`] for `source`. The summary is stripped of markup.
    pub fn into_article(self, source: &SourceDescriptor) -> Article {
        let mut article = Article::new(&source.name, &source.language, &self.title, &self.link);
        article.published_at = self
            .published
            .as_deref()
            .or(self.updated.as_deref())
            .and_then(parse_date);
        article.author = self.author.filter(|a| !a.is_empty());
        article.summary_raw = self
            .summary
            .map(|s| strip_html(&s))
            .filter(|s| !s.is_empty());
        article
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn unescape_basic(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn resolve_entity(name: &str) -> String {
    match name {
        "amp" => "&".to_string(),
        "lt" => "<".to_string(),
        "gt" => ">".to_string(),
        "quot" => "\"".to_string(),
        "apos" => "'".to_string(),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok()
            } else {
                None
            };
            match code.and_then(char::from_u32) {
                Some(c) => c.to_string(),
                None => format!("&{name};"),
            }
        }
    }
}

/// Atom `<link>`: take `href` when the relation is absent or `alternate`.
fn atom_link(e: &BytesStart<'_>) -> Option<String> {
    let mut href = None;
    let mut rel = None;
    for attr in e.attributes().flatten() {
        let value = unescape_basic(&String::from_utf8_lossy(&attr.value));
        match attr.key.local_name().as_ref() {
            b"href" => href = Some(value),
            b"rel" => rel = Some(value),
            _ => {}
        }
    }
    match rel.as_deref() {
        None | Some("alternate") => href.filter(|h| !h.is_empty()),
        _ => None,
    }
}

fn fill(slot: &mut Option<String>, value: &str) {
    if slot.is_none() && !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

/// Parse an RSS or Atom document into its entries, in document order.
///
/// # Errors
///
/// Malformed XML, or a document without an `rss`/`feed`/`channel` element.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<FeedEntry> = None;
    let mut stack: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut saw_feed = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = local_name(&e);
                match name.as_str() {
                    "rss" | "feed" | "channel" | "rdf" => saw_feed = true,
                    "item" | "entry" => current = Some(FeedEntry::default()),
                    "link" => {
                        if let (Some(entry), Some(href)) = (current.as_mut(), atom_link(&e)) {
                            if entry.link.is_empty() {
                                entry.link = href;
                            }
                        }
                    }
                    _ => {}
                }
                stack.push(name);
                text.clear();
            }
            Event::Empty(e) => {
                if local_name(&e) == "link" {
                    if let (Some(entry), Some(href)) = (current.as_mut(), atom_link(&e)) {
                        if entry.link.is_empty() {
                            entry.link = href;
                        }
                    }
                }
            }
            Event::Text(t) => text.push_str(&unescape_basic(&String::from_utf8_lossy(&t))),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::GeneralRef(r) => text.push_str(&resolve_entity(&String::from_utf8_lossy(&r))),
            Event::End(_) => {
                let name = stack.pop().unwrap_or_default();
                let parent = stack.last().map(String::as_str).unwrap_or("");
                if name == "item" || name == "entry" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                } else if let Some(entry) = current.as_mut() {
                    let value = text.trim();
                    match (name.as_str(), parent) {
                        ("title", "item" | "entry") => entry.title = value.to_string(),
                        ("link", "item" | "entry") if entry.link.is_empty() => {
                            entry.link = value.to_string()
                        }
                        ("pubdate" | "published" | "issued", _) => fill(&mut entry.published, value),
                        ("date", _) => fill(&mut entry.published, value),
                        ("updated" | "modified", _) => fill(&mut entry.updated, value),
                        ("creator", _) | ("name", "author") => fill(&mut entry.author, value),
                        ("author", "item") => fill(&mut entry.author, value),
                        ("description" | "summary", _) => fill(&mut entry.summary, value),
                        ("encoded" | "content", _) => fill(&mut entry.summary, value),
                        _ => {}
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_feed {
        return Err("document is not an RSS or Atom feed".into());
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::default_registry;
    use chrono::{TimeZone, Utc};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Kakao Tech</title>
    <link>https://tech.kakao.com</link>
    <item>
      <title>Rust &amp; Kafka at scale</title>
      <link>https://tech.kakao.com/posts/1?a=1&amp;b=2</link>
      <pubDate>Tue, 06 May 2025 09:00:00 +0900</pubDate>
      <dc:creator><![CDATA[kim.dev]]></dc:creator>
      <description><![CDATA[<p>We rewrote our <b>consumer</b>.</p>]]></description>
    </item>
    <item>
      <title>No date here</title>
      <link>https://tech.kakao.com/posts/2</link>
      <description>&lt;p&gt;Escaped markup&lt;/p&gt;</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Engineering</title>
  <link href="https://example.com/" rel="alternate"/>
  <entry>
    <title>Observability with OpenTelemetry</title>
    <link rel="replies" href="https://example.com/posts/otel#comments"/>
    <link href="https://example.com/posts/otel"/>
    <published>2025-05-06T01:00:00Z</published>
    <updated>2025-05-06T03:00:00Z</updated>
    <author><name>Lee</name></author>
    <summary type="html">Tracing &lt;em&gt;everything&lt;/em&gt;</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let entries = parse_feed(RSS).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Rust & Kafka at scale");
        assert_eq!(first.link, "https://tech.kakao.com/posts/1?a=1&b=2");
        assert_eq!(first.published.as_deref(), Some("Tue, 06 May 2025 09:00:00 +0900"));
        assert_eq!(first.author.as_deref(), Some("kim.dev"));
        assert_eq!(first.summary.as_deref(), Some("<p>We rewrote our <b>consumer</b>.</p>"));

        assert_eq!(entries[1].published, None);
        assert_eq!(entries[1].summary.as_deref(), Some("<p>Escaped markup</p>"));
    }

    #[test]
    fn test_parse_atom_entries() {
        let entries = parse_feed(ATOM).unwrap();
        assert_eq!(entries.len(), 1);

        let e = &entries[0];
        assert_eq!(e.title, "Observability with OpenTelemetry");
        assert_eq!(e.link, "https://example.com/posts/otel");
        assert_eq!(e.published.as_deref(), Some("2025-05-06T01:00:00Z"));
        assert_eq!(e.updated.as_deref(), Some("2025-05-06T03:00:00Z"));
        assert_eq!(e.author.as_deref(), Some("Lee"));
    }

    #[test]
    fn test_into_article_parses_date_and_strips_html() {
        let source = &default_registry()[3];
        let article = parse_feed(RSS).unwrap().remove(0).into_article(source);

        assert_eq!(article.source_name, source.name);
        assert_eq!(article.language, "ko");
        assert_eq!(article.published_at, Some(Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap()));
        assert_eq!(article.summary_raw.as_deref(), Some("We rewrote our consumer ."));
        assert_eq!(article.body, None);
    }

    #[test]
    fn test_rejects_non_feed_documents() {
        assert!(parse_feed("<html><body><p>hi</p></body></html>").is_err());
        assert!(parse_feed("<rss><channel><item><title>x</item></channel></rss>").is_err());
    }
}
