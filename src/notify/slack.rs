//! Slack incoming-webhook channel.

use super::{Notify, Severity};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::{Value, json};
use std::error::Error;

const DEFAULT_TITLE: &str = "Tech blog digest";

#[derive(Debug, Clone)]
pub struct SlackWebhook {
    http: Client,
    webhook_url: String,
}

fn colour(severity: Severity) -> &'static str {
    match severity {
        Severity::Good => "good",
        Severity::Danger => "danger",
    }
}

/// Webhook body: fallback text plus a coloured attachment holding
/// header, section, divider and context blocks.
pub fn payload(message: &str, title: Option<&str>, severity: Severity, sent_at: DateTime<Utc>) -> Value {
    let mut blocks = Vec::new();
    if let Some(title) = title {
        blocks.push(json!({
            "type": "header",
            "text": { "type": "plain_text", "text": title }
        }));
    }
    blocks.push(json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": message }
    }));
    blocks.push(json!({ "type": "divider" }));
    blocks.push(json!({
        "type": "context",
        "elements": [{
            "type": "mrkdwn",
            "text": format!("🤖 Generated automatically • {}", sent_at.format("%Y-%m-%d %H:%M:%S UTC"))
        }]
    }));

    json!({
        "text": title.unwrap_or(DEFAULT_TITLE),
        "attachments": [{ "color": colour(severity), "blocks": blocks }]
    })
}

impl SlackWebhook {
    pub fn new(http: Client, webhook_url: String) -> Self {
        Self { http, webhook_url }
    }
}

impl Notify for SlackWebhook {
    async fn send(&self, message: &str, title: Option<&str>, severity: Severity) -> Result<(), Box<dyn Error>> {
        self.http
            .post(&self.webhook_url)
            .json(&payload(message, title, severity, Utc::now()))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
