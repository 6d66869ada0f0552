/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;
use glossa::app_config::{Config, ModelRoute, ProviderConfig, ProviderKind};
use glossa::protection::RestoreMode;
use glossa::translation::PipelineOptions;

use crate::common::{create_temp_dir, create_test_file};

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefaults() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path)?;
    assert!(path.exists());
    assert_eq!(config.model, "gpt-4o-mini");

    let reloaded = Config::from_file(&path)?;
    assert_eq!(reloaded.model_names(), config.model_names());
    assert_eq!(reloaded.target_language, "fr");
    Ok(())
}

#[test]
fn test_saveAndLoad_shouldKeepCustomProviders() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = dir.path().join("custom.json");

    let mut config = Config::default();
    config.providers.push(ProviderConfig::ollama("local", "http://localhost:11434"));
    config.models.push(ModelRoute::new("llama-local", "local", "llama3.1:8b"));
    config.model = "llama-local".to_string();
    config.protection.strict_restore = true;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    loaded.validate()?;
    assert_eq!(loaded.provider("local").map(|p| p.kind), Some(ProviderKind::Ollama));
    assert_eq!(loaded.protection.restore_mode(), RestoreMode::Strict);
    Ok(())
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = create_test_file(dir.path(), "broken.json", "{ not json")?;
    let err = Config::from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_fromFile_withFlatProtectionSection_shouldFillOptions() -> Result<()> {
    let dir = create_temp_dir()?;
    let path = create_test_file(
        dir.path(),
        "protection.json",
        r#"{"protection": {"plain_numbers": true, "strict_restore": true}}"#,
    )?;

    let config = Config::from_file(&path)?;
    assert!(config.protection.options.numeric);
    assert!(config.protection.options.plain_numbers);
    assert_eq!(config.protection.restore_mode(), RestoreMode::Strict);

    let saved: serde_json::Value = serde_json::from_str(&serde_json::to_string(&config)?)?;
    assert_eq!(saved["protection"]["numeric"], serde_json::Value::Bool(true));
    assert!(saved["protection"].get("options").is_none());
    Ok(())
}

#[test]
fn test_validate_withSameSourceAndTarget_shouldFail() {
    let mut config = Config::default();
    config.source_language = "English".to_string();
    config.target_language = "eng".to_string();
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("same language"));
}

#[test]
fn test_validate_withOpenAiProviderWithoutEnv_shouldFail() {
    let mut config = Config::default();
    config.providers[0].env = None;
    let err = config.validate().unwrap_err().to_string();
    assert!(err.contains("openai"));
}

#[test]
fn test_validate_withDuplicateProviderKeys_shouldFail() {
    let mut config = Config::default();
    config
        .providers
        .push(ProviderConfig::openai_compatible("groq", "OTHER_KEY", None));
    assert!(config.validate().is_err());
}

#[test]
fn test_pipelineOptions_fromConfig_shouldUseLanguageNames() -> Result<()> {
    let mut config = Config::default();
    config.target_language = "ja".to_string();
    config.protection.options.plain_numbers = true;
    config.generation.review = true;

    let options = PipelineOptions::from_config(&config)?;
    assert_eq!(options.target_language, "Japanese");
    assert_eq!(options.source_language.as_deref(), Some("English"));
    assert_eq!(options.model, "gpt-4o-mini");
    assert!(options.protection.plain_numbers);
    assert!(options.review);
    assert_eq!(options.restore_mode, RestoreMode::BestEffort);
    Ok(())
}
