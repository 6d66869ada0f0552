/*!
 * Common test utilities for the glossa test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use glossa::glossary::{GlossaryConstraint, GlossaryEntry};
use glossa::translation::PipelineOptions;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Constraints for a small product catalogue
pub fn product_constraints() -> Vec<GlossaryConstraint> {
    vec![
        GlossaryConstraint::new("Widget Pro", "Widget Pro").with_notes("brand name, never translate"),
        GlossaryConstraint::new("bundle", "lot").with_definition("several products sold together"),
    ]
}

/// Glossary rows with French and German targets
pub fn sample_glossary() -> Vec<GlossaryEntry> {
    vec![
        GlossaryEntry::new("invoice")
            .with_target("fr", "facture")
            .with_target("de", "Rechnung")
            .with_definition("a bill for goods or services"),
        GlossaryEntry::new("shipping")
            .with_target("fr", "livraison")
            .with_target("de", "Versand"),
        GlossaryEntry::new("refund")
            .with_target("fr", "remboursement")
            .with_definition("money returned to a customer"),
    ]
}

/// Pipeline options for the mock model
pub fn mock_options() -> PipelineOptions {
    PipelineOptions::new("mock", "French")
}

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
