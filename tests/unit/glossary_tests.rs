/*!
 * Tests for glossary retrieval and term adherence
 */

use glossa::evaluation::term_adherence;
use glossa::glossary::{
    GlossaryConstraint, GlossaryEntry, GlossaryRetriever, best_k_terms, build_glossary_corpus,
};
use glossa::providers::mock::MockEmbedder;

use crate::common::sample_glossary;

fn target(t: &str) -> GlossaryConstraint {
    GlossaryConstraint::new("", t)
}

#[test]
fn test_termAdherence_singleTarget_shouldBeOne() {
    let score = term_adherence("Buy the Widget Pro today", &[target("Widget Pro")]);
    assert_eq!(score, 1.0);
}

#[test]
fn test_termAdherence_oneOfTwoTargets_shouldBeHalf() {
    let score = term_adherence(
        "Buy the Widget Pro today",
        &[target("Widget Pro"), target("Bundle")],
    );
    assert_eq!(score, 0.5);
}

#[test]
fn test_termAdherence_noConstraints_shouldBeOne() {
    assert_eq!(term_adherence("anything", &[]), 1.0);
}

#[test]
fn test_corpus_shouldUseRequestedLanguageColumn() {
    let documents = build_glossary_corpus(&sample_glossary(), "de");
    assert_eq!(documents.len(), 3);
    assert!(documents[0].contains("target_de: Rechnung"));
    assert!(documents[2].ends_with("target_de: \n"));
}

#[test]
fn test_glossaryEntry_fromJson_shouldCollectLanguageColumns() {
    let json = r#"[{"term": "invoice", "definition": "a bill", "fr": "facture", "es": "factura"}]"#;
    let entries: Vec<GlossaryEntry> = serde_json::from_str(json).unwrap();
    assert_eq!(entries[0].target("fr"), "facture");
    assert_eq!(entries[0].target("es"), "factura");
    assert_eq!(entries[0].target("ja"), "");
}

#[test]
fn test_glossaryEntry_fromSpreadsheetExport_shouldIgnoreNullAndNumericCells() {
    let json = r#"[
        {"id": 1, "term": "invoice", "definition": null, "fr": "facture", "ja": null},
        {"id": 2, "term": "refund", "notes": "finance", "fr": "remboursement", "ja": "返金"}
    ]"#;
    let entries: Vec<GlossaryEntry> = serde_json::from_str(json).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].definition, "");
    assert_eq!(entries[0].target("fr"), "facture");
    assert_eq!(entries[0].target("ja"), "");
    assert_eq!(entries[0].target("id"), "");
    assert_eq!(entries[1].target("ja"), "返金");

    let documents = build_glossary_corpus(&entries, "ja");
    assert!(documents[0].ends_with("target_ja: \n"));
}

#[test]
fn test_bestKTerms_withMoreThanAvailable_shouldReturnAll() {
    let documents = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    assert_eq!(best_k_terms(&[0.0, 1.0], &documents, 5), vec![1, 0]);
}

#[tokio::test]
async fn test_retriever_shouldReturnClosestRowAsConstraint() {
    let embedder = MockEmbedder::new(["invoice", "shipping", "refund"]);
    let retriever = GlossaryRetriever::new(embedder.clone(), sample_glossary(), "fr").with_top_k(1);

    let constraints = retriever.retrieve("Where is my refund?").await.unwrap();
    assert_eq!(
        constraints,
        vec![GlossaryConstraint::new("refund", "remboursement")
            .with_definition("money returned to a customer")]
    );

    retriever.retrieve("Shipping is free").await.unwrap();
    assert_eq!(embedder.call_count(), 3);
}

#[tokio::test]
async fn test_retriever_withNoOverlap_shouldKeepGlossaryOrder() {
    let embedder = MockEmbedder::new(["invoice", "shipping", "refund"]);
    let retriever = GlossaryRetriever::new(embedder, sample_glossary(), "fr").with_top_k(2);
    let constraints = retriever.retrieve("Hello there").await.unwrap();
    let terms: Vec<&str> = constraints.iter().map(|c| c.term_src.as_str()).collect();
    assert_eq!(terms, vec!["invoice", "shipping"]);
}

#[test]
fn test_retriever_withEmptyGlossary_shouldNotCallEmbedder() {
    let embedder = MockEmbedder::new(["invoice"]);
    let retriever = GlossaryRetriever::new(embedder.clone(), Vec::new(), "fr");
    let result = tokio_test::block_on(async { retriever.retrieve("invoice").await });
    assert!(result.unwrap().is_empty());
    assert_eq!(embedder.call_count(), 0);
}
