/*!
 * Error types for the glossa library.
 *
 * Span protection itself never fails on string input; the types here cover
 * the glue around it: provider calls, model routing, strict restoration and
 * custom pattern catalogs. All of them use the thiserror crate.
 */

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

/// Errors raised while routing a logical model name to a provider
#[derive(Error, Debug)]
pub enum ModelError {
    /// A credential or endpoint required by the provider is missing
    #[error("Missing API key for provider '{provider}'. Set {env_var} in your environment.")]
    Configuration {
        /// Provider key from the routing table
        provider: String,
        /// Environment variable that should hold the credential
        env_var: String,
    },

    /// The logical model name is not in the routing table
    #[error("Unknown model '{name}'. Known: {}", .known.join(", "))]
    UnknownModel {
        /// Requested model name
        name: String,
        /// Every routed model name
        known: Vec<String>,
    },

    /// A route points at a provider that is not configured
    #[error("Model '{model}' routes to unknown provider '{provider}'")]
    UnknownProvider {
        /// Model name
        model: String,
        /// Provider key that could not be found
        provider: String,
    },

    /// The provider call itself failed
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Placeholder fidelity problems found in a translated text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FidelityReport {
    /// Placeholders from the map that do not occur in the text
    pub missing: Vec<String>,
    /// Placeholders from the map that occur more than once
    pub duplicated: Vec<String>,
    /// Marker-shaped tokens in the text that the map does not know
    pub unexpected: Vec<String>,
}

impl FidelityReport {
    /// True when every placeholder occurs exactly once and nothing foreign showed up
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.duplicated.is_empty() && self.unexpected.is_empty()
    }
}

impl std::fmt::Display for FidelityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "missing: {:?}, duplicated: {:?}, unexpected: {:?}",
            self.missing, self.duplicated, self.unexpected
        )
    }
}

/// Errors raised by strict restoration
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The translated text lost, duplicated or invented placeholders
    #[error("Placeholder fidelity violated ({0})")]
    Fidelity(FidelityReport),
}

/// Errors raised while building a custom pattern catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A pattern source failed to compile
    #[error("Invalid {pass} pattern: {source}")]
    InvalidPattern {
        /// Which pass the pattern belongs to
        pass: &'static str,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },

    /// The combined markup pattern lacks a capture group for a category
    #[error("Markup pattern is missing the named group '{0}'")]
    MissingGroup(&'static str),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from model routing or the provider
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Error from strict restoration
    #[error("Restore error: {0}")]
    Restore(#[from] RestoreError),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<ModelError> for AppError {
    fn from(error: ModelError) -> Self {
        Self::Translation(TranslationError::Model(error))
    }
}
