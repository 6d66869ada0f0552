use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, Embedder, Provider};
use crate::errors::ProviderError;

/// Ollama client, used for local chat models and glossary embeddings
pub struct Ollama {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Maximum number of retry attempts
    max_retries: u32,
    /// Base backoff time in milliseconds for exponential backoff
    backoff_base_ms: u64,
    /// Model used by the `Embedder` implementation
    embedding_model: String,
}

impl std::fmt::Debug for Ollama {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ollama")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    stream: bool,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub model: String,
    pub message: ChatMessage,
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

/// Embeddings request for the Ollama API
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Embeddings response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
    pub embedding: Vec<f32>,
}

impl ChatRequest {
    /// Create a non-streaming chat request
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
            stream: false,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(max_tokens);
        self
    }
}

impl Ollama {
    /// Create a client from a host (with or without scheme) and a port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let base_url = match host.split_once("://") {
            Some((scheme, rest)) if rest.contains(':') => format!("{}://{}", scheme, rest),
            Some((scheme, rest)) => format!("{}://{}:{}", scheme, rest, port),
            None => format!("http://{}:{}", host, port),
        };
        Self::from_url(base_url)
    }

    /// Create a client from a complete base URL such as `http://localhost:11434`
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            base_url: url.into().trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(Duration::from_secs(120))
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            max_retries: 3,
            backoff_base_ms: 1000,
            embedding_model: "nomic-embed-text".to_string(),
        }
    }

    /// Set retry behaviour
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Set the model the `Embedder` implementation asks for
    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body, retrying server and network errors with exponential backoff
    async fn post_json<B: Serialize + Sync, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let mut attempt = 0;

        loop {
            let failure = match self.client.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let text = response
                            .text()
                            .await
                            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
                        return serde_json::from_str::<R>(&text).map_err(|e| {
                            let preview: String = text.chars().take(500).collect();
                            error!("Failed to parse Ollama response from {}: {}. Raw: {}", path, e, preview);
                            ProviderError::ParseError(e.to_string())
                        });
                    }
                    let message = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to get error response text".to_string());
                    let err = ProviderError::ApiError {
                        status_code: status.as_u16(),
                        message,
                    };
                    if !status.is_server_error() {
                        error!("Ollama API error on {}: {}", path, err);
                        return Err(err);
                    }
                    err
                }
                Err(e) => ProviderError::ConnectionError(e.to_string()),
            };

            attempt += 1;
            if attempt > self.max_retries {
                error!("Ollama request to {} failed after {} attempts: {}", path, attempt, failure);
                return Err(failure);
            }
            let backoff_ms = self.backoff_base_ms * (1u64 << (attempt - 1).min(16));
            debug!("Ollama attempt {} on {} failed ({}), retrying in {} ms", attempt, path, failure, backoff_ms);
            tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        }
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.post_json("/api/chat", &request).await
    }

    /// Embed a single text with the given model
    pub async fn embed_one(&self, model: &str, text: &str) -> Result<Vec<f32>, ProviderError> {
        let response: EmbeddingResponse = self
            .post_json("/api/embeddings", &EmbeddingRequest { model, prompt: text })
            .await?;
        if response.embedding.is_empty() {
            return Err(ProviderError::ParseError(
                "Ollama returned an empty embedding".to_string(),
            ));
        }
        Ok(response.embedding)
    }
}

#[async_trait]
impl Provider for Ollama {
    type Request = ChatRequest;
    type Response = ChatResponse;

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.chat(request).await
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError {
                status_code: response.status().as_u16(),
                message: "Ollama version check failed".to_string(),
            })
        }
    }

    fn extract_text(response: &ChatResponse) -> String {
        response.message.content.clone()
    }
}

#[async_trait]
impl Embedder for Ollama {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(&self.embedding_model, text).await?);
        }
        debug!("Embedded {} texts with {}", vectors.len(), self.embedding_model);
        Ok(vectors)
    }
}
