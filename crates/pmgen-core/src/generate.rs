//! The generation client: an adapter interface over external text-completion
//! services, plus the OpenAI-compatible HTTP implementation.
//!
//! The trait is object-safe so mock generators can stand in during tests.
//! One invocation makes exactly one outbound call; retry policy belongs to
//! the caller (see [`crate::retry`]).

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors from a single generation attempt.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No API credential is configured. Never retryable; the message must
    /// not contain any credential material.
    #[error("generation API key not configured; set PMGEN_API_KEY or [generation].api_key")]
    CredentialMissing,

    /// Network failure, timeout, non-2xx status, or a provider envelope the
    /// client cannot read. Retryable.
    #[error("generation service unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Adapter interface for text-generation backends.
///
/// # Object Safety
///
/// This trait is object-safe: it can be stored as `Box<dyn Generator>` or
/// passed as `&dyn Generator`, which is how tests inject mock backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name for this backend (used in logs).
    fn name(&self) -> &str;

    /// Send one prompt and return the raw text completion.
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for the OpenAI-compatible generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Bearer credential. `None` means unconfigured; every call fails with
    /// [`GenerateError::CredentialMissing`].
    pub api_key: Option<String>,
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature. Moderate by default to balance specificity and
    /// variety.
    pub temperature: f64,
    /// Completion token budget; must fit a multi-task plan.
    pub max_tokens: u32,
    /// Upper bound on the wait for one completion call.
    pub timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            temperature: 0.7,
            max_tokens: 2000,
            timeout: Duration::from_secs(45),
        }
    }
}

impl GeneratorConfig {
    /// Build a config from the environment: `PMGEN_API_KEY` for the
    /// credential, defaults for everything else.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("PMGEN_API_KEY").ok().filter(|k| !k.is_empty()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types (OpenAI-compatible chat completions)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

// ---------------------------------------------------------------------------
// OpenAI-compatible implementation
// ---------------------------------------------------------------------------

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    config: GeneratorConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Build the generator and its HTTP client. The request timeout from the
    /// config is enforced by the client itself.
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { config, client })
    }
}

/// Truncate diagnostic text so error messages stay readable.
fn truncate_for_display(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(GenerateError::CredentialMissing)?;

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: crate::prompt::SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    format!("request timed out after {:?}", self.config.timeout)
                } else {
                    format!("network error: {e}")
                };
                GenerateError::Unavailable { reason }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GenerateError::Unavailable {
                reason: format!("failed to read response body: {e}"),
            })?;

        if !status.is_success() {
            return Err(GenerateError::Unavailable {
                reason: format!("HTTP {status}: {}", truncate_for_display(&text, 300)),
            });
        }

        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| GenerateError::Unavailable {
                reason: format!("unreadable provider response: {e}"),
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerateError::Unavailable {
                reason: "provider response contained no choices".to_owned(),
            })
    }
}
