//! Chat completion: the outline request and the text half of mind-maps.
//!
//! The rest of the pipeline only sees [`CompletionService`], an ordered list
//! of role-tagged messages in and the first choice's text out. Two
//! implementations ship with the crate:
//!
//! * [`ProviderCompletion`] wraps any edgequake-llm provider (OpenAI,
//!   Anthropic, Gemini, Ollama, …).
//! * [`HttpCompletion`] posts to a raw OpenAI-compatible
//!   `/chat/completions` URL, for gateways that are not a known provider.
//!
//! ## Retry Strategy
//!
//! Only the outline request retries (`retry_backoff_ms * 2^attempt`). A
//! failed outline means there is nothing to render, while a failed mind-map
//! just becomes a placeholder slide.

use crate::config::GenerationConfig;
use crate::error::{PptGenError, ServiceError};
use crate::pipeline::postprocess::clean_outline;
use crate::prompts::{outline_user_prompt, with_reference};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Default chat model when the config names none.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-mini";

/// Speaker of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A text-completion backend.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send `messages` and return the first choice's message text.
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ServiceError>;
}

// ── edgequake-llm provider ───────────────────────────────────────────────

/// Completion through an edgequake-llm provider.
pub struct ProviderCompletion {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl ProviderCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl CompletionService for ProviderCompletion {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ServiceError> {
        let chat: Vec<ChatMessage> = messages
            .iter()
            .map(|m| match m.role {
                Role::System => ChatMessage::system(m.content.as_str()),
                Role::User => ChatMessage::user(m.content.as_str()),
            })
            .collect();
        let options = self.options();

        let response = timeout(
            Duration::from_secs(self.timeout_secs),
            self.provider.chat(&chat, Some(&options)),
        )
        .await
        .map_err(|_| ServiceError::Timeout {
            secs: self.timeout_secs,
        })?
        .map_err(|e| ServiceError::Provider(e.to_string()))?;

        debug!(
            "Completion: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

// ── Raw OpenAI-compatible endpoint ───────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    temperature: f32,
    max_tokens: usize,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Completion through a plain HTTP POST to an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletion {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl HttpCompletion {
    pub fn new(endpoint: impl Into<String>, config: &GenerationConfig) -> Result<Self, PptGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| PptGenError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: config.api_key.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.api_timeout_secs,
        })
    }
}

#[async_trait]
impl CompletionService for HttpCompletion {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        debug!("POST {} ({} messages)", self.endpoint, messages.len());

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let response = req
            .send()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::status(status.as_u16(), text));
        }

        let text = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(e, self.timeout_secs))?;
        parse_chat_response(&text)
    }
}

/// Pull the first choice's text out of a chat-completion response body.
pub(crate) fn parse_chat_response(body: &str) -> Result<String, ServiceError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| ServiceError::MalformedResponse("no choices[0].message.content".into()))
}

pub(crate) fn map_reqwest_error(e: reqwest::Error, timeout_secs: u64) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout { secs: timeout_secs }
    } else {
        ServiceError::Transport(e.to_string())
    }
}

// ── Outline generation ───────────────────────────────────────────────────

/// Ask the completion service for a tagged outline on `topic`.
///
/// ## Message Layout
///
/// 1. **System message** — outline prompt (or the configured override), with
///    the reference material appended when given
/// 2. **User message** — the topic
///
/// The returned text has already been through
/// [`crate::pipeline::postprocess::clean_outline`].
pub async fn generate_outline(
    completion: &dyn CompletionService,
    topic: &str,
    reference: Option<&str>,
    config: &GenerationConfig,
) -> Result<String, PptGenError> {
    let messages = vec![
        PromptMessage::system(with_reference(config.outline_prompt(), reference)),
        PromptMessage::user(outline_user_prompt(topic)),
    ];

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Outline: retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match completion.complete(&messages).await {
            Ok(text) => {
                info!("Outline received: {} bytes", text.len());
                return Ok(clean_outline(&text));
            }
            Err(e) => {
                warn!("Outline attempt {} failed: {}", attempt + 1, e);
                last_err = Some(e.to_string());
            }
        }
    }

    Err(PptGenError::LlmApiError {
        message: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}
