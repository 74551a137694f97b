//! JSON snapshots of a run.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── crawling_results.json   # the whole DailyResult
//!     ├── Dev.to.json             # one file per source
//!     └── Kakao_Tech.json
//! ```
//!
//! Documents are pretty-printed; non-ASCII text (Korean titles and summaries)
//! is written as-is rather than escaped.

use crate::models::{DailyResult, SourceResult};
use serde::Serialize;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

pub const RESULTS_FILE: &str = "crawling_results.json";

async fn write_pretty<T: Serialize>(value: &T, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

/// Write the full [`DailyResult`] to `path`, creating the day directory.
#[instrument(level = "info", skip_all, fields(date = %result.date_key()))]
pub async fn write_results(result: &DailyResult, path: &Path) -> Result<(), Box<dyn Error>> {
    write_pretty(result, path).await
}

/// Write one source's articles to `path`.
#[instrument(level = "info", skip_all, fields(source = %source.name, count = source.count))]
pub async fn write_source(source: &SourceResult, path: &Path) -> Result<(), Box<dyn Error>> {
    write_pretty(source, path).await
}
