//! Output generation for a finished run.
//!
//! # Submodules
//!
//! - [`json`]: full and per-source JSON snapshots
//! - [`markdown`]: the human-readable daily report
//! - [`indexes`]: `index.json` crawl history and the `README.md` link list
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── 2025-05-06/
//! │   ├── crawling_results.json
//! │   └── <source>.json
//! ├── daily-summary-2025-05-06.md
//! ├── index.json
//! └── README.md
//! ```
//!
//! Every write is independent. A failed write is logged and the remaining
//! outputs are still attempted; [`publish`] only fails when nothing at all
//! could be written.

pub mod indexes;
pub mod json;
pub mod markdown;

use crate::config::OutputSettings;
use crate::error::PipelineError;
use crate::models::DailyResult;
use crate::utils::file_slug;
use chrono::{DateTime, Utc};
use std::error::Error;
use std::path::PathBuf;
use tracing::{error, info, instrument};

/// Which outputs of a publish succeeded.
#[derive(Debug, Default)]
pub struct PublishReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl PublishReport {
    fn record(&mut self, path: PathBuf, outcome: Result<(), Box<dyn Error>>) {
        match outcome {
            Ok(()) => self.written.push(path),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Output write failed; continuing");
                self.failed.push((path, e.to_string()));
            }
        }
    }
}

/// Write every output for `result` under `settings.output_dir`.
///
/// `now` stamps the report and the index entry.
#[instrument(level = "info", skip_all, fields(date = %result.date_key(), dir = %settings.output_dir.display()))]
pub async fn publish(
    result: &DailyResult,
    settings: &OutputSettings,
    now: DateTime<Utc>,
) -> Result<PublishReport, PipelineError> {
    let date = result.date_key();
    let day_dir = settings.output_dir.join(&date);
    let mut report = PublishReport::default();

    let results_path = day_dir.join(json::RESULTS_FILE);
    let outcome = json::write_results(result, &results_path).await;
    report.record(results_path, outcome);

    for source in &result.articles_by_source {
        let path = day_dir.join(format!("{}.json", file_slug(&source.name)));
        let outcome = json::write_source(source, &path).await;
        report.record(path, outcome);
    }

    let report_path = settings.output_dir.join(markdown::report_file_name(&date));
    let outcome = markdown::write_report(result, now, &report_path).await;
    report.record(report_path, outcome);

    let index_path = settings.output_dir.join(indexes::INDEX_FILE);
    let outcome = indexes::update_crawl_index(&index_path, result, now, settings.history_days).await;
    report.record(index_path, outcome);

    let readme_path = settings.output_dir.join(indexes::README_FILE);
    let outcome = indexes::update_readme(&readme_path, result).await;
    report.record(readme_path, outcome);

    if report.written.is_empty() {
        let reason = report
            .failed
            .first()
            .map(|(path, e)| format!("{}: {e}", path.display()))
            .unwrap_or_else(|| "no outputs attempted".to_string());
        return Err(PipelineError::Publish { date, reason });
    }

    info!(written = report.written.len(), failed = report.failed.len(), "Published daily outputs");
    Ok(report)
}
