//! Telegram Bot API channel (`sendMessage`).

use super::{Notify, Severity};
use reqwest::Client;
use serde::Serialize;
use std::error::Error;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramBot {
    http: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

/// Backslash-escape the legacy Markdown entity characters.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Text and parse mode for one message. Error reports carry arbitrary paths
/// and messages, so they go out as plain text.
fn compose(message: &str, title: Option<&str>, severity: Severity) -> (String, Option<&'static str>) {
    match severity {
        Severity::Good => {
            let text = match title {
                Some(title) => format!("*{}*\n\n{}", escape_markdown(title), escape_markdown(message)),
                None => escape_markdown(message),
            };
            (text, Some("Markdown"))
        }
        Severity::Danger => {
            let text = match title {
                Some(title) => format!("❌ {title}\n\n{message}"),
                None => format!("❌ {message}"),
            };
            (text, None)
        }
    }
}

impl TelegramBot {
    pub fn new(http: Client, token: String, chat_id: String) -> Self {
        Self {
            http,
            api_base: TELEGRAM_API.to_string(),
            token,
            chat_id,
        }
    }

    /// Point at another Bot API server.
    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }
}

impl Notify for TelegramBot {
    async fn send(&self, message: &str, title: Option<&str>, severity: Severity) -> Result<(), Box<dyn Error>> {
        let (text, parse_mode) = compose(message, title, severity);
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };
        self.http
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
