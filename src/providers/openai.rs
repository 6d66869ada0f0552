/*!
 * Client for OpenAI-compatible chat completion endpoints.
 *
 * OpenAI itself, Groq and any other service speaking the same
 * `/chat/completions` protocol are reached through this client; only the
 * base URL and the key differ.
 */

use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, Provider};
use crate::errors::ProviderError;

/// Endpoint used when a provider has no base URL of its own
pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";

/// OpenAI-compatible API client
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as a bearer token
    api_key: String,
    /// Base URL, e.g. `https://api.groq.com/openai/v1`
    endpoint: String,
    /// Maximum number of retries after the first attempt
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
}

impl std::fmt::Debug for OpenAI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAI")
            .field("endpoint", &self.endpoint)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .finish_non_exhaustive()
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct OpenAIRequest {
    /// Remote model identifier
    model: String,
    /// Conversation so far
    messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

impl OpenAIRequest {
    /// Create a new request for a remote model id
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Append a whole transcript
    pub fn messages(mut self, messages: &[ChatMessage]) -> Self {
        self.messages.extend_from_slice(messages);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Token usage reported by the endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAIUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// One completion choice
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message inside a choice; some servers send `null` content
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAI {
    /// Create a client with default retry settings
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, 60, 3, 1000)
    }

    /// Create a client with explicit timeout and retry settings
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_OPENAI_ENDPOINT.to_string()
        } else {
            endpoint.trim_end_matches('/').to_string()
        };

        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint,
            max_retries,
            backoff_base_ms,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }

    /// Map a non-success status to an error, telling whether a retry makes sense
    fn classify_failure(status: StatusCode, body: String) -> (ProviderError, bool) {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                (ProviderError::AuthenticationError(body), false)
            }
            StatusCode::TOO_MANY_REQUESTS => (ProviderError::RateLimitExceeded(body), false),
            s if s.is_server_error() => (
                ProviderError::ApiError {
                    status_code: s.as_u16(),
                    message: body,
                },
                true,
            ),
            s => (
                ProviderError::ApiError {
                    status_code: s.as_u16(),
                    message: body,
                },
                false,
            ),
        }
    }

    async fn send_once(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, (ProviderError, bool)> {
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let err = if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                };
                (err, true)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(Self::classify_failure(status, body));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| (ProviderError::ParseError(e.to_string()), false))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    /// Send a chat completion, retrying server and network failures with backoff
    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.send_once(&request).await {
                Ok(response) => return Ok(response),
                Err((err, retryable)) => {
                    if !retryable || attempt >= self.max_retries {
                        error!(
                            "Chat completion for '{}' at {} failed: {}",
                            request.model, self.endpoint, err
                        );
                        return Err(err);
                    }
                    attempt += 1;
                    let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
                    debug!(
                        "Chat completion attempt {}/{} failed ({}), retrying in {} ms",
                        attempt,
                        self.max_retries + 1,
                        err,
                        backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/models", self.endpoint);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Self::classify_failure(status, body).0)
        }
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}
