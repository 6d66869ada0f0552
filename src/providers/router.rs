/*!
 * Routing from logical model names to configured providers.
 *
 * A logical name (`llama3-70b`) resolves to a provider key and the id that
 * provider expects (`groq`, `llama-3.3-70b-versatile`). Credentials are
 * looked up before any network traffic; a missing key is a configuration
 * error and is never retried.
 */

use async_trait::async_trait;
use log::{debug, info};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::ollama::{ChatRequest, Ollama};
use super::openai::{OpenAI, OpenAIRequest};
use super::{ChatMessage, Provider, TextGenerator};
use crate::app_config::{Config, ModelRoute, ProviderConfig, ProviderKind};
use crate::errors::{ModelError, ProviderError};

/// Where API keys come from
#[derive(Debug, Clone, Default)]
pub enum CredentialSource {
    /// Process environment
    #[default]
    Environment,
    /// Fixed variable name to value map
    Map(HashMap<String, String>),
}

impl CredentialSource {
    /// Value of `var`; blank values count as missing
    pub fn lookup(&self, var: &str) -> Option<String> {
        let value = match self {
            Self::Environment => std::env::var(var).ok(),
            Self::Map(map) => map.get(var).cloned(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

/// Client built for one provider
#[derive(Debug, Clone)]
enum ProviderClient {
    OpenAI(Arc<OpenAI>),
    Ollama(Arc<Ollama>),
}

/// `TextGenerator` that dispatches on the routing table
#[derive(Debug)]
pub struct ModelRouter {
    providers: Vec<ProviderConfig>,
    routes: Vec<ModelRoute>,
    credentials: CredentialSource,
    temperature: f32,
    max_tokens: Option<u32>,
    clients: Mutex<HashMap<String, ProviderClient>>,
}

impl ModelRouter {
    pub fn new(providers: Vec<ProviderConfig>, routes: Vec<ModelRoute>) -> Self {
        Self {
            providers,
            routes,
            credentials: CredentialSource::default(),
            temperature: 0.2,
            max_tokens: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Router over the configured providers and routes
    pub fn from_config(config: &Config) -> Self {
        let mut router = Self::new(config.providers.clone(), config.models.clone())
            .with_temperature(config.generation.temperature);
        router.max_tokens = config.generation.max_tokens;
        router
    }

    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Routed model names in table order
    pub fn known_models(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.name.clone()).collect()
    }

    pub fn routes(&self) -> &[ModelRoute] {
        &self.routes
    }

    /// Find the route and provider for a logical model name
    pub fn resolve(&self, model: &str) -> Result<(&ModelRoute, &ProviderConfig), ModelError> {
        let route = self
            .routes
            .iter()
            .find(|r| r.name == model)
            .ok_or_else(|| ModelError::UnknownModel {
                name: model.to_string(),
                known: self.known_models(),
            })?;
        let provider = self
            .providers
            .iter()
            .find(|p| p.key == route.provider)
            .ok_or_else(|| ModelError::UnknownProvider {
                model: model.to_string(),
                provider: route.provider.clone(),
            })?;
        Ok((route, provider))
    }

    /// Check that the provider behind `model` is reachable and accepts our key
    pub async fn check_connection(&self, model: &str) -> Result<(), ModelError> {
        let (_, provider) = self.resolve(model)?;
        let client = self.client_for(provider)?;
        match client {
            ProviderClient::OpenAI(client) => client.test_connection().await?,
            ProviderClient::Ollama(client) => client.test_connection().await?,
        }
        debug!("Provider '{}' answered the connection check", provider.key);
        Ok(())
    }

    /// Build (or reuse) the client for a provider, checking its credential first
    fn client_for(&self, provider: &ProviderConfig) -> Result<ProviderClient, ModelError> {
        if let Some(client) = self.clients.lock().get(&provider.key) {
            return Ok(client.clone());
        }

        let client = match provider.kind {
            ProviderKind::OpenaiCompatible => {
                let env_var = provider.env.clone().unwrap_or_default();
                let api_key = self.credentials.lookup(&env_var).ok_or_else(|| {
                    ModelError::Configuration {
                        provider: provider.key.clone(),
                        env_var: env_var.clone(),
                    }
                })?;
                ProviderClient::OpenAI(Arc::new(OpenAI::new_with_config(
                    api_key,
                    provider.base_url.clone().unwrap_or_default(),
                    provider.timeout_secs,
                    provider.max_retries,
                    provider.retry_backoff_ms,
                )))
            }
            ProviderKind::Ollama => {
                let base_url = provider
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string());
                ProviderClient::Ollama(Arc::new(
                    Ollama::from_url(base_url)
                        .with_retries(provider.max_retries, provider.retry_backoff_ms),
                ))
            }
        };

        info!("Created client for provider '{}'", provider.key);
        self.clients
            .lock()
            .insert(provider.key.clone(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl TextGenerator for ModelRouter {
    async fn generate(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let (route, provider) = self.resolve(model)?;
        let client = self.client_for(provider)?;
        debug!(
            "Routing '{}' to provider '{}' as '{}'",
            model, provider.key, route.remote_id
        );

        let text = match client {
            ProviderClient::OpenAI(client) => {
                let mut request = OpenAIRequest::new(route.remote_id.as_str())
                    .messages(messages)
                    .temperature(self.temperature);
                if let Some(max_tokens) = self.max_tokens {
                    request = request.max_tokens(max_tokens);
                }
                let response = client.complete(request).await?;
                if response.choices.is_empty() {
                    return Err(ProviderError::ParseError(format!(
                        "Provider '{}' returned no choices",
                        provider.key
                    ))
                    .into());
                }
                OpenAI::extract_text(&response)
            }
            ProviderClient::Ollama(client) => {
                let mut request = ChatRequest::new(route.remote_id.as_str(), messages.to_vec())
                    .temperature(self.temperature);
                if let Some(max_tokens) = self.max_tokens {
                    request = request.max_tokens(max_tokens);
                }
                let response = client.complete(request).await?;
                Ollama::extract_text(&response)
            }
        };

        Ok(text)
    }
}
