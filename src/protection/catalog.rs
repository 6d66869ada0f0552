/*!
 * Pattern catalog for span protection.
 *
 * The catalog holds three compiled patterns, one per protection pass:
 *
 * 1. `markup`: a single alternation covering tags, comments, CDATA, double
 *    and single brace placeholders, code spans and character entities. Each
 *    alternative lives in a named group so the protector can tell which
 *    category won. Alternatives are listed in priority order; the regex
 *    engine is leftmost-first, so at a given position the earlier group wins.
 * 2. `numeric`: currency amounts, percentages, dates and times.
 * 3. `plain_number`: any other standalone number.
 *
 * A catalog is immutable once built and is shared behind an `Arc`.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::CatalogError;

/// Category of a protected span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanCategory {
    /// `<b>`, `</b>`, `<br/>`, `<!-- -->`, `<![CDATA[ ]]>`
    Markup,
    /// `{{name}}`, `{user_name}`
    Placeholder,
    /// Fenced or inline code
    Code,
    /// `&amp;`, `&#160;`, `&#xA0;`
    Entity,
    /// Currency, percentages, dates and times
    Numeric,
    /// Bare numbers (only when enabled)
    PlainNumber,
}

impl SpanCategory {
    /// Every category, in priority order
    pub const ALL: [SpanCategory; 6] = [
        SpanCategory::Markup,
        SpanCategory::Placeholder,
        SpanCategory::Code,
        SpanCategory::Entity,
        SpanCategory::Numeric,
        SpanCategory::PlainNumber,
    ];

    /// Label used inside placeholder markers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Markup => "TAG",
            Self::Placeholder => "PH",
            Self::Code => "CODE",
            Self::Entity => "ENT",
            Self::Numeric => "NUM",
            Self::PlainNumber => "NUMBER",
        }
    }

    /// Reverse of [`SpanCategory::label`]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

impl std::fmt::Display for SpanCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Named groups of the markup pattern and the category each one maps to
const MARKUP_GROUPS: [(&str, SpanCategory); 5] = [
    ("tag", SpanCategory::Markup),
    ("dbrace", SpanCategory::Placeholder),
    ("brace", SpanCategory::Placeholder),
    ("code", SpanCategory::Code),
    ("entity", SpanCategory::Entity),
];

// Comments and CDATA first, then element tags. Quoted attribute values may contain '>'.
const TAG_PATTERN: &str = r#"(?P<tag><!--[\s\S]*?-->|<!\[CDATA\[[\s\S]*?\]\]>|</?[A-Za-z][A-Za-z0-9:._-]*(?:\s+(?:[^<>"']|"[^"]*"|'[^']*')*)?/?>)"#;

const DOUBLE_BRACE_PATTERN: &str = r"(?P<dbrace>\{\{[^{}]+\}\})";

// Must start with a letter or underscore so "{2,3}" and similar prose stay translatable.
const SINGLE_BRACE_PATTERN: &str = r"(?P<brace>\{[A-Za-z_][A-Za-z0-9_:., |-]*\})";

const CODE_PATTERN: &str = r"(?P<code>```[\s\S]*?```|`[^`\n]+`)";

const ENTITY_PATTERN: &str = r"(?P<entity>&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);)";

const NUMBER: &str = r"(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?";
const CURRENCY_SYMBOL: &str = r"[$€£¥₹₩₽₺₫₱]";
const CURRENCY_CODE: &str = r"(?:USD|EUR|GBP|JPY|CNY|CHF|CAD|AUD|NZD|INR|KRW|RUB|BRL|MXN|SEK|NOK|DKK|PLN|TRY|ZAR)";

const PLAIN_NUMBER_PATTERN: &str = r"\b\d+(?:[.,]\d+)*\b";

/// The markup pattern used by [`PatternCatalog::standard`]
pub fn standard_markup_pattern() -> String {
    [
        TAG_PATTERN,
        DOUBLE_BRACE_PATTERN,
        SINGLE_BRACE_PATTERN,
        CODE_PATTERN,
        ENTITY_PATTERN,
    ]
    .join("|")
}

/// The numeric pattern used by [`PatternCatalog::standard`]
pub fn standard_numeric_pattern() -> String {
    let alternatives = [
        // ISO date, US date, time
        r"\b\d{4}-\d{2}-\d{2}\b".to_string(),
        r"\b\d{1,2}/\d{1,2}/\d{4}\b".to_string(),
        r"\b\d{1,2}:\d{2}(?::\d{2})?\b".to_string(),
        // symbol or code before the amount
        format!(r"{CURRENCY_SYMBOL}[ \x{{a0}}]?{NUMBER}"),
        format!(r"\b{CURRENCY_CODE}[ \x{{a0}}]?{NUMBER}"),
        // symbol or code after the amount
        format!(r"\b{NUMBER}[ \x{{a0}}]?(?:{CURRENCY_SYMBOL}|{CURRENCY_CODE}\b)"),
        format!(r"\b{NUMBER}%"),
    ];
    alternatives.join("|")
}

static STANDARD_CATALOG: Lazy<Arc<PatternCatalog>> = Lazy::new(|| {
    Arc::new(
        PatternCatalog::builder()
            .build()
            .expect("standard pattern catalog must compile"),
    )
});

/// Ordered set of span-matching rules
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    markup: Regex,
    numeric: Regex,
    plain_number: Regex,
}

impl PatternCatalog {
    /// Shared instance of the standard catalog
    pub fn standard() -> Arc<PatternCatalog> {
        Arc::clone(&STANDARD_CATALOG)
    }

    /// Start building a catalog from the standard patterns
    pub fn builder() -> PatternCatalogBuilder {
        PatternCatalogBuilder::default()
    }

    /// Combined pattern for the markup pass
    pub fn markup(&self) -> &Regex {
        &self.markup
    }

    /// Pattern for the numeric pass
    pub fn numeric(&self) -> &Regex {
        &self.numeric
    }

    /// Pattern for the plain-number pass
    pub fn plain_number(&self) -> &Regex {
        &self.plain_number
    }

    /// Category of a markup-pass match, decided by which named group took part.
    ///
    /// Custom patterns whose winning alternative is outside every known group
    /// are treated as markup.
    pub fn classify(&self, captures: &Captures<'_>) -> SpanCategory {
        MARKUP_GROUPS
            .iter()
            .find(|(name, _)| captures.name(name).is_some())
            .map(|(_, category)| *category)
            .unwrap_or(SpanCategory::Markup)
    }
}

/// Builder for custom catalogs
#[derive(Debug, Clone)]
pub struct PatternCatalogBuilder {
    markup: String,
    numeric: String,
    plain_number: String,
}

impl Default for PatternCatalogBuilder {
    fn default() -> Self {
        Self {
            markup: standard_markup_pattern(),
            numeric: standard_numeric_pattern(),
            plain_number: PLAIN_NUMBER_PATTERN.to_string(),
        }
    }
}

impl PatternCatalogBuilder {
    /// Replace the markup pattern. It must use at least one of the named
    /// groups `tag`, `dbrace`, `brace`, `code` or `entity`.
    pub fn markup_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.markup = pattern.into();
        self
    }

    /// Replace the numeric pattern
    pub fn numeric_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.numeric = pattern.into();
        self
    }

    /// Replace the plain-number pattern
    pub fn plain_number_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.plain_number = pattern.into();
        self
    }

    /// Compile every pattern
    pub fn build(self) -> Result<PatternCatalog, CatalogError> {
        let markup = compile("markup", &self.markup)?;
        let has_group = markup
            .capture_names()
            .flatten()
            .any(|name| MARKUP_GROUPS.iter().any(|(group, _)| *group == name));
        if !has_group {
            return Err(CatalogError::MissingGroup("tag|dbrace|brace|code|entity"));
        }

        Ok(PatternCatalog {
            markup,
            numeric: compile("numeric", &self.numeric)?,
            plain_number: compile("plain number", &self.plain_number)?,
        })
    }
}

fn compile(pass: &'static str, source: &str) -> Result<Regex, CatalogError> {
    Regex::new(source).map_err(|source| CatalogError::InvalidPattern { pass, source })
}
