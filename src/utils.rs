//! Utility functions for date parsing, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Lenient timestamp parsing for the many date shapes blogs publish
//! - String truncation for logging and for capping article bodies
//! - JSON error detection for handling LLM response truncation
//! - File system validation and atomic writes for output files

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Marker appended to bodies cut at the length cap.
pub const TRUNCATION_MARKER: &str = "...";

/// Naive formats tried after RFC 2822 and RFC 3339. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y.%m.%d", "%Y.%m.%d."];

/// Parse a publish timestamp into UTC.
///
/// Accepted shapes, in order:
/// - RFC 2822 (`Tue, 06 May 2025 14:30:00 +0900`), the usual RSS `pubDate`
/// - RFC 3339 / ISO 8601 with an offset or `Z`
/// - ISO 8601 and a few plain formats without an offset, read as UTC
///
/// Offsets are applied, never discarded, so an article published just after
/// midnight in Seoul is compared against the cutoff at its real instant.
///
/// # Returns
///
/// `None` for empty or unparseable input.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    tracing::debug!(raw = %s, "Unparseable date");
    None
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Cap `s` at `max` characters, appending [`TRUNCATION_MARKER`] when cut.
///
/// Works on `char` boundaries so Korean and other multi-byte text is safe.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}{}", &s[..cut], TRUNCATION_MARKER),
    }
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Strip markup from an HTML fragment, returning its collapsed text.
///
/// Feed descriptions frequently carry escaped HTML; this turns them into
/// plain text suitable for prompts and reports.
pub fn strip_html(fragment: &str) -> String {
    let doc = scraper::Html::parse_fragment(fragment);
    let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
    collapse_whitespace(&text)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the LLM response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Turn a source name into a file stem: spaces become underscores and
/// path separators are removed. Non-ASCII letters are kept.
///
/// ```ignore
/// assert_eq!(file_slug("Medium Engineering"), "Medium_Engineering");
/// ```
pub fn file_slug(name: &str) -> String {
    name.trim()
        .replace(' ', "_")
        .replace(|c: char| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'), "")
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Output directory is writable");
    Ok(())
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
///
/// Readers of `path` see either the old or the new document, never a partial one.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Box<dyn Error>> {
    let file_name = path
        .file_name()
        .ok_or_else(|| format!("not a file path: {}", path.display()))?
        .to_string_lossy()
        .into_owned();
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));
    fs::write(&tmp, contents).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
