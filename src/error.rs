//! Errors that fail a whole run.
//!
//! Per-source and per-article failures never reach this type: the fetcher and
//! summarizer log them and carry on. Only conditions that leave the run with
//! nothing to show end up here.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("output directory {path} is not writable: {reason}")]
    OutputDir { path: String, reason: String },

    #[error("no output could be written for {date}: {reason}")]
    Publish { date: String, reason: String },
}

impl PipelineError {
    /// Stable identifier used as `error_type` in notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "ConfigError",
            PipelineError::OutputDir { .. } => "OutputDirError",
            PipelineError::Publish { .. } => "PublishError",
        }
    }

    /// Stage in which the error surfaced.
    pub fn location(&self) -> &'static str {
        match self {
            PipelineError::Config(_) => "config::load",
            PipelineError::OutputDir { .. } => "pipeline::prepare_output",
            PipelineError::Publish { .. } => "outputs::publish",
        }
    }
}

/// Payload sent through the error channel of every notifier.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error_type: String,
    pub error_message: String,
    pub location: String,
    pub timestamp: String,
}

impl ErrorReport {
    pub fn from_error(err: &PipelineError) -> Self {
        Self {
            error_type: err.kind().to_string(),
            error_message: err.to_string(),
            location: err.location().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Markdown body used by the notifiers.
    pub fn to_message(&self) -> String {
        format!(
            "*Type*: `{}`\n*Message*: {}\n*Location*: `{}`\n*Time*: {}",
            self.error_type, self.error_message, self.location, self.timestamp
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_report_from_publish_error() {
        let err = PipelineError::Publish {
            date: "2025-05-06".to_string(),
            reason: "disk full".to_string(),
        };
        let report = ErrorReport::from_error(&err);

        assert_eq!(report.error_type, "PublishError");
        assert_eq!(report.location, "outputs::publish");
        assert!(report.error_message.contains("2025-05-06"));
        assert!(report.error_message.contains("disk full"));
        assert!(report.to_message().contains("`PublishError`"));

        let json = serde_json::to_value(&report).unwrap();
        for key in ["error_type", "error_message", "location", "timestamp"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}
