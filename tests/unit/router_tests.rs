/*!
 * Tests for model routing and credential checks
 */

use std::collections::HashMap;

use glossa::app_config::{Config, ModelRoute, ProviderConfig};
use glossa::errors::{ModelError, TranslationError};
use glossa::providers::{ChatMessage, CredentialSource, ModelRouter, TextGenerator};
use glossa::translation::TranslationPipeline;

use crate::common::mock_options;

fn no_credentials() -> CredentialSource {
    CredentialSource::Map(HashMap::new())
}

#[tokio::test]
async fn test_generate_withUnknownModel_shouldNameKnownModels() {
    let router = ModelRouter::from_config(&Config::default()).with_credentials(no_credentials());
    let err = router
        .generate("claude-x", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("claude-x"));
    for known in ["gpt-4o-mini", "llama3-8b", "llama3-70b"] {
        assert!(message.contains(known), "{message} should list {known}");
    }
}

#[tokio::test]
async fn test_generate_withMissingOpenAiKey_shouldBeConfigurationError() {
    let router = ModelRouter::from_config(&Config::default()).with_credentials(no_credentials());
    let err = router
        .generate("gpt-4o-mini", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    match err {
        ModelError::Configuration { provider, env_var } => {
            assert_eq!(provider, "openai");
            assert_eq!(env_var, "OPENAI_API_KEY");
        }
        other => panic!("expected a configuration error, got {other}"),
    }
}

#[tokio::test]
async fn test_generate_withCustomProvider_shouldUseItsEnvVar() {
    let providers = vec![ProviderConfig::openai_compatible(
        "together",
        "TOGETHER_API_KEY",
        Some("https://api.together.xyz/v1"),
    )];
    let routes = vec![ModelRoute::new("mixtral", "together", "mistralai/Mixtral-8x7B")];
    let router = ModelRouter::new(providers, routes).with_credentials(no_credentials());
    let err = router
        .generate("mixtral", &[ChatMessage::user("hi")])
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing API key for provider 'together'. Set TOGETHER_API_KEY in your environment."
    );
}

#[tokio::test]
async fn test_pipeline_withUnroutableModel_shouldSurfaceModelError() {
    let router = ModelRouter::from_config(&Config::default()).with_credentials(no_credentials());
    let pipeline = TranslationPipeline::new(router, mock_options());
    let err = pipeline.translate("Hello", &[]).await.unwrap_err();
    assert!(matches!(
        err,
        TranslationError::Model(ModelError::UnknownModel { .. })
    ));
}

#[test]
fn test_knownModels_shouldFollowTableOrder() {
    let router = ModelRouter::from_config(&Config::default());
    assert_eq!(router.known_models(), vec!["gpt-4o-mini", "llama3-8b", "llama3-70b"]);
    assert_eq!(router.routes().len(), 3);
}
