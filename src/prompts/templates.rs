/*!
 * Prompt templates for constrained translation and review.
 *
 * Translation prompts carry the glossary constraints as a bullet table and
 * the protected source under a `SOURCE:` header. Review prompts show the
 * protected source next to the candidate, both with markers in place, and
 * expect either `NO_CHANGES` or a corrected candidate back.
 */

use serde::{Deserialize, Serialize};

use crate::glossary::GlossaryConstraint;
use crate::protection::{RestorationMap, SpanProtector};
use crate::providers::ChatMessage;

/// Header introducing the text to translate
pub const SOURCE_HEADER: &str = "SOURCE:";

/// Header introducing the translation under review
pub const CANDIDATE_HEADER: &str = "CANDIDATE TRANSLATION:";

/// Reply meaning the reviewed candidate is fine as is
pub const NO_CHANGES: &str = "NO_CHANGES";

/// How the instructions are split into chat messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptStyle {
    /// Rules in a system message, source in a user message
    #[default]
    SystemAndUser,
    /// Everything in a single user message
    Combined,
}

/// Instruction template rendered with the target language and constraint table
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Rules for constrained translation
    pub const CONSTRAINED_TRANSLATOR: &'static str = r#"You are a professional translator. Translate the SOURCE into the TARGET LANGUAGE.
Follow these rules strictly:
1) Honor protected markers such as ⟦TAG_0⟧, ⟦PH_1⟧ or ⟦NUM_2⟧: copy each one exactly once, do not translate, split or remove them, and keep them next to the words they belong to.
2) Apply the glossary constraints exactly (match case/spacing unless noted).
3) Keep tone neutral and natural.
4) If the glossary suggests keeping acronyms (e.g., GPU, ID), keep them.
5) Reply with the translation only, without quotes or commentary.

GLOSSARY CONSTRAINTS:
{constraint_table}

EDGE-CASE GUIDANCE:
- Gender/morphology: choose natural forms; if brand names, keep unchanged.
- Casing: preserve title casing for product/policy names unless target convention differs.
- Verb vs noun 'checkout': translate based on context.

TARGET LANGUAGE: {target_language}"#;

    /// Rules for the quality-control pass
    pub const REVIEWER: &'static str = r#"You are a meticulous translation reviewer. Compare the SOURCE with the CANDIDATE TRANSLATION into the TARGET LANGUAGE.
Look only for fidelity violations:
- meaning added, dropped or changed
- glossary constraints not applied exactly
- protected markers such as ⟦TAG_0⟧ missing, duplicated, altered or moved to the wrong words

If there is no violation, reply with exactly NO_CHANGES.
Otherwise reply with the corrected translation only, keeping every marker exactly once.

GLOSSARY CONSTRAINTS:
{constraint_table}

TARGET LANGUAGE: {target_language}"#;

    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    pub fn constrained_translator() -> Self {
        Self::new(Self::CONSTRAINED_TRANSLATOR)
    }

    pub fn reviewer() -> Self {
        Self::new(Self::REVIEWER)
    }

    /// Render the template with the given variables
    pub fn render(&self, target_language: &str, constraint_table: &str) -> String {
        self.template
            .replace("{target_language}", target_language)
            .replace("{constraint_table}", constraint_table)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::constrained_translator()
    }
}

/// Bullet list of constraints, or `None` when there are none
pub fn build_constraint_table(constraints: &[GlossaryConstraint]) -> String {
    if constraints.is_empty() {
        return "None".to_string();
    }
    constraints
        .iter()
        .map(|c| {
            let mut row = format!("- '{}' → '{}'  (def: {})", c.term_src, c.target, c.definition);
            if !c.notes.trim().is_empty() {
                row.push_str(&format!(" [notes: {}]", c.notes.trim()));
            }
            row
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn source_language_line(source_language: Option<&str>) -> String {
    source_language
        .map(|lang| format!("\nSOURCE LANGUAGE: {}", lang))
        .unwrap_or_default()
}

fn custom_instructions_block(custom: Option<&str>) -> String {
    custom
        .filter(|c| !c.trim().is_empty())
        .map(|c| format!("\n\nADDITIONAL INSTRUCTIONS:\n{}", c.trim()))
        .unwrap_or_default()
}

fn into_messages(style: PromptStyle, system: String, user: String) -> Vec<ChatMessage> {
    match style {
        PromptStyle::SystemAndUser => vec![ChatMessage::system(system), ChatMessage::user(user)],
        PromptStyle::Combined => vec![ChatMessage::user(format!("{}\n\n{}", system, user))],
    }
}

/// A translation request ready to send, with what is needed to undo the protection
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    pub messages: Vec<ChatMessage>,
    /// Source text with markers, as embedded in the prompt
    pub protected_source: String,
    pub restoration: RestorationMap,
}

/// Builder for constrained translation prompts
#[derive(Debug, Clone)]
pub struct TranslationPromptBuilder {
    target_language: String,
    source_language: Option<String>,
    constraints: Vec<GlossaryConstraint>,
    custom_instructions: Option<String>,
    style: PromptStyle,
    template: PromptTemplate,
}

impl TranslationPromptBuilder {
    /// `target_language` should be a language name such as "French"
    pub fn new(target_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            source_language: None,
            constraints: Vec::new(),
            custom_instructions: None,
            style: PromptStyle::default(),
            template: PromptTemplate::constrained_translator(),
        }
    }

    pub fn with_constraints(mut self, constraints: &[GlossaryConstraint]) -> Self {
        self.constraints = constraints.to_vec();
        self
    }

    pub fn with_source_language(mut self, source_language: &str) -> Self {
        self.source_language = Some(source_language.to_string());
        self
    }

    pub fn with_custom_instructions(mut self, instructions: &str) -> Self {
        self.custom_instructions = Some(instructions.to_string());
        self
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Build the system prompt
    pub fn build_system_prompt(&self) -> String {
        let rules = self
            .template
            .render(&self.target_language, &build_constraint_table(&self.constraints));
        format!(
            "{}{}{}",
            rules,
            source_language_line(self.source_language.as_deref()),
            custom_instructions_block(self.custom_instructions.as_deref())
        )
    }

    /// Build the user prompt around already-protected text
    pub fn build_user_prompt(&self, protected_source: &str) -> String {
        format!("{}\n{}", SOURCE_HEADER, protected_source)
    }

    /// Protect `source` and assemble the messages
    pub fn build(&self, protector: &SpanProtector, source: &str) -> PreparedPrompt {
        let (protected_source, restoration) = protector.protect(source).into_parts();
        let messages = into_messages(
            self.style,
            self.build_system_prompt(),
            self.build_user_prompt(&protected_source),
        );
        PreparedPrompt {
            messages,
            protected_source,
            restoration,
        }
    }
}

/// Outcome of a review request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "text", rename_all = "snake_case")]
pub enum ReviewVerdict {
    Approved,
    Corrected(String),
}

/// Builder for the quality-control request
#[derive(Debug, Clone)]
pub struct ReviewPromptBuilder {
    target_language: String,
    source_language: Option<String>,
    constraints: Vec<GlossaryConstraint>,
    style: PromptStyle,
}

impl ReviewPromptBuilder {
    pub fn new(target_language: &str) -> Self {
        Self {
            target_language: target_language.to_string(),
            source_language: None,
            constraints: Vec::new(),
            style: PromptStyle::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: &[GlossaryConstraint]) -> Self {
        self.constraints = constraints.to_vec();
        self
    }

    pub fn with_source_language(mut self, source_language: &str) -> Self {
        self.source_language = Some(source_language.to_string());
        self
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    /// Both texts are expected to still carry their markers
    pub fn build(&self, protected_source: &str, candidate: &str) -> Vec<ChatMessage> {
        let system = format!(
            "{}{}",
            PromptTemplate::reviewer()
                .render(&self.target_language, &build_constraint_table(&self.constraints)),
            source_language_line(self.source_language.as_deref())
        );
        let user = format!(
            "{}\n{}\n\n{}\n{}",
            SOURCE_HEADER, protected_source, CANDIDATE_HEADER, candidate
        );
        into_messages(self.style, system, user)
    }
}

/// Interpret the reviewer's reply
///
/// `NO_CHANGES` (ignoring case, surrounding quotes, backticks and a final
/// period) and empty replies approve the candidate; anything else is taken
/// as the corrected text.
pub fn parse_review_response(response: &str) -> ReviewVerdict {
    let trimmed = response.trim();
    let bare = trimmed.trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == '.' || c.is_whitespace());
    if bare.is_empty() || bare.eq_ignore_ascii_case(NO_CHANGES) {
        ReviewVerdict::Approved
    } else {
        ReviewVerdict::Corrected(trimmed.to_string())
    }
}
