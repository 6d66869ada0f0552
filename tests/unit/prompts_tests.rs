/*!
 * Tests for translation and review prompt assembly
 */

use glossa::glossary::GlossaryConstraint;
use glossa::prompts::{
    CANDIDATE_HEADER, PromptStyle, PromptTemplate, ReviewPromptBuilder, ReviewVerdict,
    SOURCE_HEADER, TranslationPromptBuilder, build_constraint_table, parse_review_response,
};
use glossa::protection::SpanProtector;

use crate::common::product_constraints;

#[test]
fn test_build_withConstraints_shouldEmbedTableAndProtectedSource() {
    let prepared = TranslationPromptBuilder::new("French")
        .with_constraints(&product_constraints())
        .build(&SpanProtector::default(), "Get the <b>Widget Pro</b> bundle for $49");

    assert_eq!(prepared.messages.len(), 2);
    assert_eq!(prepared.messages[0].role, "system");
    let system = &prepared.messages[0].content;
    assert!(system.contains("TARGET LANGUAGE: French"));
    assert!(system.contains("- 'Widget Pro' → 'Widget Pro'  (def: ) [notes: brand name, never translate]"));
    assert!(system.contains("- 'bundle' → 'lot'  (def: several products sold together)"));

    assert_eq!(prepared.protected_source, "Get the ⟦TAG_0⟧Widget Pro⟦TAG_1⟧ bundle for ⟦NUM_2⟧");
    assert_eq!(
        prepared.messages[1].content,
        format!("{}\n{}", SOURCE_HEADER, prepared.protected_source)
    );
    assert_eq!(prepared.restoration.len(), 3);
}

#[test]
fn test_build_shouldNeverLeakOriginalSpans() {
    let prepared = TranslationPromptBuilder::new("German")
        .build(&SpanProtector::default(), "Hello {{user}}, see <a href=\"/docs\">docs</a>");
    for message in &prepared.messages {
        assert!(!message.content.contains("{{user}}"));
        assert!(!message.content.contains("href"));
    }
}

#[test]
fn test_build_withSourceLanguageAndInstructions_shouldAppendThem() {
    let builder = TranslationPromptBuilder::new("Japanese")
        .with_source_language("English")
        .with_custom_instructions("  Use polite forms.  ");
    let system = builder.build_system_prompt();
    assert!(system.contains("\nSOURCE LANGUAGE: English"));
    assert!(system.ends_with("ADDITIONAL INSTRUCTIONS:\nUse polite forms."));
}

#[test]
fn test_build_withBlankInstructions_shouldOmitBlock() {
    let system = TranslationPromptBuilder::new("Spanish")
        .with_custom_instructions("   ")
        .build_system_prompt();
    assert!(!system.contains("ADDITIONAL INSTRUCTIONS"));
}

#[test]
fn test_build_combinedStyle_shouldSendOneUserMessage() {
    let prepared = TranslationPromptBuilder::new("French")
        .with_style(PromptStyle::Combined)
        .build(&SpanProtector::default(), "Hi");
    assert_eq!(prepared.messages.len(), 1);
    assert_eq!(prepared.messages[0].role, "user");
    assert!(prepared.messages[0].content.ends_with("SOURCE:\nHi"));
}

#[test]
fn test_customTemplate_shouldRenderVariables() {
    let template = PromptTemplate::new("Into {target_language}. Terms:\n{constraint_table}");
    let rendered = template.render("Italian", &build_constraint_table(&[]));
    assert_eq!(rendered, "Into Italian. Terms:\nNone");
}

#[test]
fn test_reviewPrompt_shouldShowSourceAndCandidate() {
    let constraints = vec![GlossaryConstraint::new("cart", "panier")];
    let messages = ReviewPromptBuilder::new("French")
        .with_constraints(&constraints)
        .build("Your ⟦TAG_0⟧cart⟦TAG_1⟧", "Votre ⟦TAG_0⟧panier⟦TAG_1⟧");
    assert_eq!(messages.len(), 2);
    assert!(messages[0].content.contains("NO_CHANGES"));
    assert!(messages[0].content.contains("- 'cart' → 'panier'"));
    assert_eq!(
        messages[1].content,
        format!(
            "{}\nYour ⟦TAG_0⟧cart⟦TAG_1⟧\n\n{}\nVotre ⟦TAG_0⟧panier⟦TAG_1⟧",
            SOURCE_HEADER, CANDIDATE_HEADER
        )
    );
}

#[test]
fn test_parseReviewResponse_shouldTolerateDecoration() {
    assert_eq!(parse_review_response("NO_CHANGES"), ReviewVerdict::Approved);
    assert_eq!(parse_review_response("  `no_changes`. \n"), ReviewVerdict::Approved);
    assert_eq!(parse_review_response(""), ReviewVerdict::Approved);
    assert_eq!(
        parse_review_response(" Votre panier \n"),
        ReviewVerdict::Corrected("Votre panier".to_string())
    );
}
