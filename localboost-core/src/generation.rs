//! Generation provider — OpenAI-compatible chat completions.
//!
//! Provides a `GenerationProvider` trait and the `OpenAiChatClient`
//! implementation that sends one system + user message pair per call.
//! There are no retries: one failed call fails the request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GenerationConfig;

// ============================================================================
// GenerationProvider trait
// ============================================================================

/// Abstraction over text-completion providers.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Send `prompt` as the user message and return the first completion's text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("Completion contained no text")]
    EmptyCompletion,

    #[error("Missing API key")]
    MissingApiKey,
}

impl GenerationError {
    /// True when the provider could not be reached or is not configured, as
    /// opposed to having answered with an error.
    pub fn is_unavailable(&self) -> bool {
        match self {
            GenerationError::Http(e) => e.is_connect() || e.is_timeout(),
            GenerationError::MissingApiKey => true,
            _ => false,
        }
    }
}

// ============================================================================
// Parameters
// ============================================================================

#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

/// Build the configured generation provider.
pub fn create_generation_provider(
    config: &GenerationConfig,
) -> Result<Arc<dyn GenerationProvider>, GenerationError> {
    let client = OpenAiChatClient::new(
        config.base_url.clone(),
        config.api_key.clone(),
        GenerationParams::from(config),
        Duration::from_secs(config.timeout_seconds),
    )?;
    Ok(Arc::new(client))
}

// ============================================================================
// OpenAI API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: Option<OpenAiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// OpenAiChatClient
// ============================================================================

/// Chat-completions client — calls `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    params: GenerationParams,
}

impl OpenAiChatClient {
    /// A missing API key is reported on the first call, so the service can
    /// still start and answer its health route.
    pub fn new(
        base_url: String,
        api_key: String,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            params,
        })
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }
}

#[async_trait]
impl GenerationProvider for OpenAiChatClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.params.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &self.params.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message)
                .unwrap_or(error_body);

            tracing::error!(code = status.as_u16(), message = %message, "Generation API error");

            return Err(GenerationError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or(GenerationError::EmptyCompletion)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// TESTS
// ============================================================================
