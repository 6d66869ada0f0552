use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

use crate::protection::{ProtectionOptions, RestoreMode};

/// Application configuration
///
/// Loaded from `conf.json`; every section falls back to its defaults when
/// absent so a partial file is enough.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language of the source strings (ISO code or English name)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language to translate into (ISO code or English name)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Logical model name used when none is given on the command line
    #[serde(default = "default_model")]
    pub model: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Span protection switches
    #[serde(default)]
    pub protection: ProtectionConfig,

    /// Connection settings per provider
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,

    /// Logical model name to provider routing
    #[serde(default = "default_models")]
    pub models: Vec<ModelRoute>,

    /// Generation parameters
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Glossary retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Which wire protocol a provider speaks
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// `/chat/completions` with a bearer key (OpenAI, Groq, LM Studio, ...)
    #[default]
    OpenaiCompatible,
    /// Local Ollama server, no credential
    Ollama,
}

/// Connection settings for one provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Key referenced by model routes, e.g. `groq`
    pub key: String,

    #[serde(default)]
    pub kind: ProviderKind,

    /// Environment variable holding the API key, if one is required
    #[serde(default)]
    pub env: Option<String>,

    /// Base URL; the provider default is used when absent
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on server or network errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff time, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

/// One routing table row
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ModelRoute {
    /// Logical name used by callers
    pub name: String,
    /// Provider key
    pub provider: String,
    /// Model identifier the provider expects
    pub remote_id: String,
}

/// Span protection switches
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionConfig {
    /// Which optional passes run; stored as `numeric` and `plain_numbers`
    #[serde(flatten)]
    pub options: ProtectionOptions,

    /// Reject translations that lost, duplicated or invented markers
    #[serde(default)]
    pub strict_restore: bool,
}

/// Generation parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Maximum number of strings translated at the same time
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Run the quality-control review after each translation
    #[serde(default)]
    pub review: bool,
}

/// Glossary retrieval settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetrievalConfig {
    /// Number of glossary terms turned into constraints
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Ollama embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Ollama base URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "fr".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_temperature() -> f32 {
    0.2
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_top_k() -> usize {
    3
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::openai_compatible("openai", "OPENAI_API_KEY", None),
        ProviderConfig::openai_compatible(
            "groq",
            "GROQ_API_KEY",
            Some("https://api.groq.com/openai/v1"),
        ),
    ]
}

fn default_models() -> Vec<ModelRoute> {
    vec![
        ModelRoute::new("gpt-4o-mini", "openai", "gpt-4o-mini"),
        ModelRoute::new("llama3-8b", "groq", "llama-3.1-8b-instant"),
        ModelRoute::new("llama3-70b", "groq", "llama-3.3-70b-versatile"),
    ]
}

impl ProviderConfig {
    /// Provider speaking the OpenAI protocol with a key from `env`
    pub fn openai_compatible(key: &str, env: &str, base_url: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            kind: ProviderKind::OpenaiCompatible,
            env: Some(env.to_string()),
            base_url: base_url.map(str::to_string),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }

    /// Local Ollama server
    pub fn ollama(key: &str, base_url: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: ProviderKind::Ollama,
            env: None,
            base_url: Some(base_url.to_string()),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl ModelRoute {
    pub fn new(name: &str, provider: &str, remote_id: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: provider.to_string(),
            remote_id: remote_id.to_string(),
        }
    }
}

impl Default for ProtectionConfig {
    fn default() -> Self {
        Self {
            options: ProtectionOptions::default(),
            strict_restore: false,
        }
    }
}

impl ProtectionConfig {
    pub fn options(&self) -> ProtectionOptions {
        self.options
    }

    pub fn restore_mode(&self) -> RestoreMode {
        if self.strict_restore {
            RestoreMode::Strict
        } else {
            RestoreMode::BestEffort
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: None,
            concurrent_requests: default_concurrent_requests(),
            review: false,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            embedding_model: default_embedding_model(),
            endpoint: default_ollama_endpoint(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            target_language: default_target_language(),
            model: default_model(),
            log_level: LogLevel::default(),
            protection: ProtectionConfig::default(),
            providers: default_providers(),
            models: default_models(),
            generation: GenerationConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load the configuration, writing the defaults first when the file does not exist
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::get_language_name(&self.source_language)?;
        crate::language_utils::get_language_name(&self.target_language)?;
        if crate::language_utils::language_codes_match(&self.source_language, &self.target_language) {
            return Err(anyhow!(
                "Source '{}' and target '{}' name the same language",
                self.source_language,
                self.target_language
            ));
        }

        for (i, provider) in self.providers.iter().enumerate() {
            if provider.key.trim().is_empty() {
                return Err(anyhow!("Provider #{} has an empty key", i));
            }
            if self.providers[..i].iter().any(|p| p.key == provider.key) {
                return Err(anyhow!("Provider '{}' is defined twice", provider.key));
            }
            if let Some(base_url) = &provider.base_url {
                Url::parse(base_url).with_context(|| {
                    format!("Invalid base_url for provider '{}': {}", provider.key, base_url)
                })?;
            }
            if provider.kind == ProviderKind::OpenaiCompatible && provider.env.is_none() {
                return Err(anyhow!(
                    "Provider '{}' needs an 'env' entry naming its API key variable",
                    provider.key
                ));
            }
        }

        for route in &self.models {
            if self.provider(&route.provider).is_none() {
                return Err(anyhow!(
                    "Model '{}' routes to unknown provider '{}'",
                    route.name,
                    route.provider
                ));
            }
        }

        if self.route(&self.model).is_none() {
            return Err(anyhow!(
                "Default model '{}' is not in the routing table. Known: {}",
                self.model,
                self.model_names().join(", ")
            ));
        }

        if self.generation.concurrent_requests == 0 {
            return Err(anyhow!("generation.concurrent_requests must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow!(
                "generation.temperature must be between 0 and 2, got {}",
                self.generation.temperature
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(anyhow!("retrieval.top_k must be at least 1"));
        }
        Url::parse(&self.retrieval.endpoint)
            .with_context(|| format!("Invalid retrieval endpoint: {}", self.retrieval.endpoint))?;

        Ok(())
    }

    pub fn provider(&self, key: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.key == key)
    }

    pub fn route(&self, name: &str) -> Option<&ModelRoute> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Routed model names in table order
    pub fn model_names(&self) -> Vec<String> {
        self.models.iter().map(|m| m.name.clone()).collect()
    }
}
