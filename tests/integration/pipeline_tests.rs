/*!
 * Integration tests for the protect, translate, restore round trip.
 *
 * The mock generator reads the protected source back out of the prompt,
 * so these tests exercise prompt assembly, marker handling and restoration
 * together.
 */

use std::sync::atomic::{AtomicUsize, Ordering};

use glossa::errors::TranslationError;
use glossa::protection::{ProtectionOptions, RestoreMode};
use glossa::providers::mock::MockGenerator;
use glossa::translation::{TranslationPipeline, TranslationRequest};

use crate::common::{init_test_logging, mock_options, product_constraints};

#[tokio::test]
async fn test_translate_withConstraints_shouldRestoreAndScore() {
    init_test_logging();
    let generator = MockGenerator::working()
        .with_replacement("Buy", "Achetez")
        .with_replacement("bundle", "lot");
    let pipeline = TranslationPipeline::new(generator.clone(), mock_options());

    let outcome = pipeline
        .translate("Buy the <b>Widget Pro</b> bundle for $49", &product_constraints())
        .await
        .unwrap();

    assert_eq!(outcome.translation, "Achetez the <b>Widget Pro</b> lot for $49");
    assert_eq!(outcome.raw_output, "Achetez the ⟦TAG_0⟧Widget Pro⟦TAG_1⟧ lot for ⟦NUM_2⟧");
    assert_eq!(outcome.adherence, 1.0);
    assert!(outcome.fidelity.is_clean());

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "mock");
    assert!(calls[0].1[0].content.contains("'bundle' → 'lot'"));
    assert!(!calls[0].1[1].content.contains("<b>"));
}

#[tokio::test]
async fn test_translate_withMissingTerm_shouldLowerAdherence() {
    let pipeline = TranslationPipeline::new(MockGenerator::echo(), mock_options());
    let outcome = pipeline
        .translate("Buy the Widget Pro bundle", &product_constraints())
        .await
        .unwrap();
    assert_eq!(outcome.translation, "Buy the Widget Pro bundle");
    assert_eq!(outcome.adherence, 0.5);
}

#[tokio::test]
async fn test_translate_withDuplicatedMarker_shouldDependOnMode() {
    init_test_logging();
    let best_effort = TranslationPipeline::new(MockGenerator::duplicating(), mock_options());
    let outcome = best_effort.translate("Hi {{name}}", &[]).await.unwrap();
    assert_eq!(outcome.translation, "Hi {{name}} {{name}}");
    assert_eq!(outcome.fidelity.duplicated, vec!["⟦PH_0⟧".to_string()]);

    let mut options = mock_options();
    options.restore_mode = RestoreMode::Strict;
    let strict = TranslationPipeline::new(MockGenerator::duplicating(), options);
    let err = strict.translate("Hi {{name}}", &[]).await.unwrap_err();
    assert!(matches!(err, TranslationError::Restore(_)));
}

#[tokio::test]
async fn test_translate_withPlainNumbers_shouldProtectCounts() {
    let mut options = mock_options();
    options.protection = ProtectionOptions {
        numeric: true,
        plain_numbers: true,
    };
    let pipeline = TranslationPipeline::new(MockGenerator::echo(), options);
    let outcome = pipeline.translate("Add 3 items, save 50%", &[]).await.unwrap();
    assert_eq!(outcome.raw_output, "Add ⟦NUMBER_1⟧ items, save ⟦NUM_0⟧");
    assert_eq!(outcome.translation, "Add 3 items, save 50%");
}

#[tokio::test]
async fn test_translateBatch_withIntermittentFailures_shouldReportPerItem() {
    let mut options = mock_options();
    options.concurrent_requests = 1;
    let pipeline = TranslationPipeline::new(MockGenerator::intermittent(3), options);
    let requests: Vec<TranslationRequest> = (0..6)
        .map(|i| TranslationRequest::new(format!("<p>row {}</p>", i), vec![]))
        .collect();

    let results = pipeline.translate_batch(&requests).await;
    let failed: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_err())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(failed, vec![2, 5]);
    assert_eq!(results[0].as_ref().unwrap().translation, "<p>row 0</p>");
}

#[tokio::test]
async fn test_translateBatchWithProgress_shouldCountEveryString() {
    let pipeline = TranslationPipeline::new(MockGenerator::echo(), mock_options());
    let requests: Vec<TranslationRequest> = ["one", "two", "three", "four", "five"]
        .iter()
        .map(|s| TranslationRequest::new(*s, vec![]))
        .collect();
    let calls = AtomicUsize::new(0);
    let last = AtomicUsize::new(0);

    let results = pipeline
        .translate_batch_with_progress(&requests, |done, total| {
            assert_eq!(total, 5);
            calls.fetch_add(1, Ordering::SeqCst);
            last.fetch_max(done, Ordering::SeqCst);
        })
        .await;

    assert_eq!(results.len(), 5);
    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert_eq!(last.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_translateBatch_withBlankLines_shouldKeepThemWithoutModelCalls() {
    let generator = MockGenerator::working().with_replacement("one", "un");
    let pipeline = TranslationPipeline::new(generator.clone(), mock_options());
    let requests: Vec<TranslationRequest> = ["one", "", "   ", "one more"]
        .iter()
        .map(|s| TranslationRequest::new(*s, vec![]))
        .collect();

    let results = pipeline.translate_batch(&requests).await;
    let lines: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().translation)
        .collect();

    assert_eq!(lines, vec!["un", "", "   ", "un more"]);
    assert_eq!(generator.calls().len(), 2);
}
