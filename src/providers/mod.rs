/*!
 * Provider implementations and the capability traits the pipeline needs.
 *
 * - `openai`: OpenAI-compatible chat completions (OpenAI, Groq, ...)
 * - `ollama`: local Ollama server, used for embeddings
 * - `router`: maps logical model names onto configured providers
 * - `mock`: scripted generator and embedder for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::{ModelError, ProviderError};

/// Common trait for all HTTP providers
///
/// Each provider has its own wire request/response types; the router only
/// needs to complete a request and pull the text back out.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Chat-style message exchanged with a text generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Something that turns a chat transcript into text
///
/// `model` is a logical model name; implementations decide how it maps onto
/// a concrete endpoint.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError>;
}

/// Something that turns texts into embedding vectors, one per input
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[async_trait]
impl<T: TextGenerator + ?Sized> TextGenerator for std::sync::Arc<T> {
    async fn generate(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        (**self).generate(model, messages).await
    }
}

#[async_trait]
impl<E: Embedder + ?Sized> Embedder for std::sync::Arc<E> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        (**self).embed(texts).await
    }
}

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod router;

pub use router::{CredentialSource, ModelRouter};
