//! Outbound notifications.
//!
//! Every channel accepts the same `(message, title, severity)` shape through
//! the [`Notify`] trait. [`Notifiers`] fans a message out to every configured
//! channel; delivery failures are logged and never fail the run.

pub mod slack;
pub mod telegram;

use crate::config::NotifySettings;
use crate::models::DailyResult;
use reqwest::Client;
use std::error::Error;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub use slack::SlackWebhook;
pub use telegram::TelegramBot;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
/// Topics listed in the digest message.
const DIGEST_TOPICS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Danger,
}

/// A delivery channel.
pub trait Notify {
    async fn send(&self, message: &str, title: Option<&str>, severity: Severity) -> Result<(), Box<dyn Error>>;
}

#[derive(Debug, Clone)]
pub enum Channel {
    Slack(SlackWebhook),
    Telegram(TelegramBot),
}

impl Channel {
    fn name(&self) -> &'static str {
        match self {
            Channel::Slack(_) => "slack",
            Channel::Telegram(_) => "telegram",
        }
    }
}

impl Notify for Channel {
    async fn send(&self, message: &str, title: Option<&str>, severity: Severity) -> Result<(), Box<dyn Error>> {
        match self {
            Channel::Slack(slack) => slack.send(message, title, severity).await,
            Channel::Telegram(telegram) => telegram.send(message, title, severity).await,
        }
    }
}

/// Every configured channel.
#[derive(Debug, Clone, Default)]
pub struct Notifiers {
    channels: Vec<Channel>,
}

impl Notifiers {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    /// Channels for which credentials are configured.
    pub fn from_settings(settings: &NotifySettings) -> Result<Self, Box<dyn Error>> {
        let http = Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        let mut channels = Vec::new();

        if let Some(url) = &settings.slack_webhook_url {
            channels.push(Channel::Slack(SlackWebhook::new(http.clone(), url.clone())));
        }
        match (&settings.telegram_bot_token, &settings.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                channels.push(Channel::Telegram(TelegramBot::new(http.clone(), token.clone(), chat_id.clone())));
            }
            (Some(_), None) => warn!("Telegram bot token set without a chat id; Telegram disabled"),
            _ => {}
        }

        if channels.is_empty() {
            info!("No notification channels configured");
        }
        Ok(Self::new(channels))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Send to every channel. Returns how many deliveries succeeded.
    #[instrument(level = "info", skip_all, fields(channels = self.channels.len(), ?severity))]
    pub async fn broadcast(&self, message: &str, title: Option<&str>, severity: Severity) -> usize {
        let mut delivered = 0;
        for channel in &self.channels {
            match channel.send(message, title, severity).await {
                Ok(()) => {
                    info!(channel = channel.name(), "Notification sent");
                    delivered += 1;
                }
                Err(e) => warn!(channel = channel.name(), error = %e, "Notification failed"),
            }
        }
        delivered
    }
}

/// Short announcement of a published digest.
pub fn digest_message(result: &DailyResult) -> String {
    let mut message = format!(
        "📰 Today's tech blog digest is ready!\n\n\
         📅 Date: {}\n\
         📊 Articles collected: {}\n\
         🔥 Trending topics: {}",
        result.date_key(),
        result.total_article_count,
        result.trending_topics.len()
    );
    if !result.trending_topics.is_empty() {
        message.push_str("\n\nTop topics:");
        for topic in result.trending_topics.iter().take(DIGEST_TOPICS) {
            message.push_str(&format!("\n• {}", topic.topic));
        }
    }
    message
}
