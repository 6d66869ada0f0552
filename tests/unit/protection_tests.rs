/*!
 * Tests for span protection and restoration
 */

use glossa::errors::RestoreError;
use glossa::protection::{
    PatternCatalog, ProtectionOptions, RestoreMode, SpanCategory, SpanProtector, SpanRestorer,
    protect, restore,
};
use std::sync::Arc;

fn protector(numeric: bool, plain_numbers: bool) -> SpanProtector {
    SpanProtector::with_options(ProtectionOptions {
        numeric,
        plain_numbers,
    })
}

fn tokens(text: &str) -> Vec<String> {
    protect(text)
        .restoration_map()
        .iter()
        .map(|e| e.placeholder.as_str().to_string())
        .collect()
}

/// Three distinct markers that restore in any order
#[test]
fn test_protect_tagIntegrity_shouldRestoreInAnyOrder() {
    let protected = protect("Click <b>here</b> for {{name}}");
    let markers = tokens("Click <b>here</b> for {{name}}");
    assert_eq!(markers.len(), 3);
    assert_ne!(markers[0], markers[1]);
    assert_ne!(markers[1], markers[2]);

    let shuffled = format!("{} {} {}", markers[2], markers[0], markers[1]);
    let restored = restore(&shuffled, protected.restoration_map());
    assert_eq!(restored, "{{name}} <b> </b>");
}

#[test]
fn test_protect_thenRestoreUntouched_shouldReproduceInput() {
    let inputs = [
        "",
        "plain prose without anything special",
        "Click <b>here</b> for {{name}}",
        r#"<a href="/x?a=1&amp;b=2">Total: €1,299.00</a> on 2024-05-01 at 10:30"#,
        "Run `cargo build` then ```\nfn main() {}\n``` &nbsp; {count, plural}",
        "<!-- keep --><![CDATA[a < b]]>{user_name} paid USD 40 (15% off)",
        "score 50% · 12 apples · 3.5 kg",
    ];
    for input in inputs {
        let protected = protector(true, true).protect(input);
        assert_eq!(protected.restore(), input, "round trip failed for {input:?}");
    }
}

#[test]
fn test_protect_singleBraces_shouldOnlyCoverIdentifiers() {
    let protected = protect("{x} vs {2,3}");
    assert_eq!(protected.text(), "⟦PH_0⟧ vs {2,3}");
    assert_eq!(protected.restoration_map().original("⟦PH_0⟧"), Some("{x}"));
}

#[test]
fn test_protect_codeAndEntities_shouldUseOwnLabels() {
    let protected = protect("Use `npm install` &amp; go");
    assert_eq!(protected.text(), "Use ⟦CODE_0⟧ ⟦ENT_1⟧ go");
}

#[test]
fn test_protect_commentBeforeTags_shouldBeOneSpan() {
    let protected = protect("<!-- note --><p>x</p>");
    assert_eq!(protected.text(), "⟦TAG_0⟧⟦TAG_1⟧x⟦TAG_2⟧");
    assert_eq!(protected.restoration_map().original("⟦TAG_0⟧"), Some("<!-- note -->"));
}

#[test]
fn test_protect_percentAndTime_shouldBeNumeric() {
    let protected = protect("Pay 50% today at 10:30");
    assert_eq!(protected.text(), "Pay ⟦NUM_0⟧ today at ⟦NUM_1⟧");
}

/// With plain numbers on, "50" before '%' is covered only by the percent token
#[test]
fn test_protect_plainNumberGuard_shouldDeferToPercentToken() {
    let both = protector(true, true).protect("score 50%");
    assert_eq!(both.text(), "score ⟦NUM_0⟧");
    assert_eq!(both.restoration_map().original("⟦NUM_0⟧"), Some("50%"));

    let plain_only = protector(false, true).protect("score 50%");
    assert_eq!(plain_only.text(), "score 50%");
    assert!(plain_only.restoration_map().is_empty());
}

#[test]
fn test_protect_plainNumbersOff_shouldLeaveCounts() {
    let protected = protect("Buy 3 apples");
    assert_eq!(protected.text(), "Buy 3 apples");
    assert_eq!(protector(true, true).protect("Buy 3 apples").text(), "Buy ⟦NUMBER_0⟧ apples");
}

#[test]
fn test_protect_spans_shouldNotOverlap() {
    let text = r#"<span title="50%">{{count}} items</span> for $9.99 and 7 more"#;
    let protected = protector(true, true).protect(text);
    let spans = protected.spans();
    assert!(!spans.is_empty());
    for pair in spans.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    let categories: Vec<SpanCategory> = spans.iter().map(|s| s.category).collect();
    assert_eq!(
        categories,
        vec![
            SpanCategory::Markup,
            SpanCategory::Placeholder,
            SpanCategory::Markup,
            SpanCategory::Numeric,
            SpanCategory::PlainNumber,
        ]
    );
}

#[test]
fn test_protect_customCatalog_shouldBeUsed() {
    let catalog = PatternCatalog::builder()
        .markup_pattern(r"(?P<brace>%[sd])")
        .build()
        .unwrap();
    let protector = SpanProtector::new(Arc::new(catalog), ProtectionOptions::default());
    let protected = protector.protect("Hello %s, you have %d <b>new</b> messages");
    assert_eq!(
        protected.text(),
        "Hello ⟦PH_0⟧, you have ⟦PH_1⟧ <b>new</b> messages"
    );
}

#[test]
fn test_restorer_strict_withForeignMarker_shouldReportUnexpected() {
    let protected = protect("Hi <b>");
    let err = SpanRestorer::strict()
        .restore("Salut ⟦TAG_0⟧ ⟦TAG_7⟧", protected.restoration_map())
        .unwrap_err();
    let RestoreError::Fidelity(report) = err;
    assert!(report.missing.is_empty());
    assert_eq!(report.unexpected, vec!["⟦TAG_7⟧".to_string()]);
}

#[test]
fn test_restorer_bestEffort_withDuplicate_shouldReplaceEveryCopy() {
    let protected = protect("{{name}} says hi");
    let restorer = SpanRestorer::new(RestoreMode::BestEffort);
    let restored = restorer
        .restore("⟦PH_0⟧ dit bonjour ⟦PH_0⟧", protected.restoration_map())
        .unwrap();
    assert_eq!(restored, "{{name}} dit bonjour {{name}}");
}

#[test]
fn test_restore_withoutAnyMarkers_shouldReturnTextUnchanged() {
    let protected = protect("<i>Bonjour</i>");
    assert_eq!(restore("Bonjour", protected.restoration_map()), "Bonjour");
}
