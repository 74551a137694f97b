//! Language-model API access.
//!
//! The summarizer talks to the model only through the [`AskAsync`] trait, so
//! tests can substitute a stub and providers can be swapped by configuration.
//!
//! # Providers
//!
//! - OpenAI chat completions (`POST {base}/chat/completions`), which also
//!   covers any OpenAI-compatible server
//! - Anthropic messages (`POST {base}/messages`)
//!
//! Every request carries the configured timeout and is attempted exactly once.
//! Callers decide how to degrade on failure.

use crate::cli::LlmProvider;
use crate::config::LlmSettings;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Trait for async LLM interaction.
///
/// Implementors send a system instruction plus a user prompt and return the
/// model's text reply.
pub trait AskAsync {
    async fn ask(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>>;
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    content: Option<String>,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// HTTP client for the configured provider.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: Client,
    settings: LlmSettings,
    api_key: String,
}

impl ChatClient {
    pub fn new(settings: LlmSettings, api_key: String) -> Result<Self, Box<dyn Error>> {
        let http = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    async fn ask_openai(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
        let req = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };
        let resp: ChatResponse = self
            .http
            .post(format!("{}/chat/completions", self.settings.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| "chat completion returned no content".into())
    }

    async fn ask_claude(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
        let req = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };
        let resp: MessagesResponse = self
            .http
            .post(format!("{}/messages", self.settings.base_url))
            .header("x-api-key", self.api_key.as_str())
            .header("anthropic-version", "2023-06-01")
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text: String = resp.content.into_iter().filter_map(|b| b.text).collect();
        if text.is_empty() {
            return Err("messages API returned no text".into());
        }
        Ok(text)
    }
}

impl AskAsync for ChatClient {
    #[instrument(level = "debug", skip_all, fields(provider = ?self.settings.provider, model = %self.settings.model))]
    async fn ask(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = match self.settings.provider {
            LlmProvider::Openai => self.ask_openai(system, prompt).await,
            LlmProvider::Claude => self.ask_claude(system, prompt).await,
        };
        let dt = t0.elapsed();

        match &res {
            Ok(text) => debug!(elapsed_ms = dt.as_millis() as u64, chars = text.chars().count(), "LLM call succeeded"),
            Err(e) => warn!(elapsed_ms = dt.as_millis() as u64, error = %e, "LLM call failed"),
        }
        res
    }
}

/// The client chosen at startup: a real provider, or disabled when no API key is set.
#[derive(Debug, Clone)]
pub enum LlmClient {
    Chat(ChatClient),
    Disabled,
}

impl LlmClient {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, Box<dyn Error>> {
        match &settings.api_key {
            Some(key) => Ok(LlmClient::Chat(ChatClient::new(settings.clone(), key.clone())?)),
            None => {
                warn!(provider = ?settings.provider, "No LLM API key configured; summaries will be empty");
                Ok(LlmClient::Disabled)
            }
        }
    }
}

impl AskAsync for LlmClient {
    async fn ask(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
        match self {
            LlmClient::Chat(client) => client.ask(system, prompt).await,
            LlmClient::Disabled => Err("LLM disabled: no API key".into()),
        }
    }
}
