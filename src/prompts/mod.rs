/*!
 * Prompt assembly for constrained translation.
 *
 * Pure templating: the only protection logic here is the call into the
 * span protector before the source is embedded.
 */

pub mod templates;

pub use templates::{
    CANDIDATE_HEADER, NO_CHANGES, PreparedPrompt, PromptStyle, PromptTemplate, ReviewPromptBuilder,
    ReviewVerdict, SOURCE_HEADER, TranslationPromptBuilder, build_constraint_table,
    parse_review_response,
};
