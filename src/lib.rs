/*!
 * # glossa - glossary-constrained machine translation
 *
 * A Rust library for translating strings that embed markup, placeholders
 * and numeric tokens, while enforcing a glossary of term translations.
 *
 * ## Features
 *
 * - Reversible span protection: tags, `{{placeholders}}`, `{named}` slots,
 *   code, entities, currency, percentages, dates and times are swapped for
 *   opaque `⟦LABEL_N⟧` markers before translation and restored afterwards
 * - Best-effort or strict restoration with a placeholder fidelity report
 * - Prompt assembly with a glossary constraint table and a review pass
 * - Model routing to OpenAI-compatible chat endpoints (OpenAI, Groq, ...)
 * - Glossary retrieval by embedding similarity (Ollama embeddings)
 * - Term adherence scoring
 *
 * ## Architecture
 *
 * - `protection`: the span protection engine
 *   - `protection::catalog`: pattern catalog
 *   - `protection::protector`: multi-pass protector
 *   - `protection::restorer`: restoration
 * - `prompts`: translation and review prompt templates
 * - `glossary`: constraints, corpus building and retrieval
 * - `evaluation`: term adherence
 * - `providers`: generator/embedder traits, HTTP clients and the model router
 * - `translation`: the protect-translate-restore pipeline
 * - `app_config`: configuration
 * - `language_utils`: ISO language code utilities
 * - `errors`: error types
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod errors;
pub mod evaluation;
pub mod glossary;
pub mod language_utils;
pub mod prompts;
pub mod protection;
pub mod providers;
pub mod translation;

pub use app_config::Config;
pub use errors::{AppError, ModelError, ProviderError, RestoreError, TranslationError};
pub use evaluation::term_adherence;
pub use glossary::{GlossaryConstraint, GlossaryEntry, GlossaryRetriever};
pub use language_utils::{get_language_name, language_codes_match};
pub use prompts::{ReviewPromptBuilder, TranslationPromptBuilder, build_constraint_table};
pub use protection::{
    PatternCatalog, ProtectedText, ProtectionOptions, RestorationMap, RestoreMode, SpanProtector,
    SpanRestorer, protect, restore,
};
pub use providers::{ChatMessage, Embedder, ModelRouter, TextGenerator};
pub use translation::{TranslationOutcome, TranslationPipeline};
