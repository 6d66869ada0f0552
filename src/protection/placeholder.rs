/*!
 * Placeholder markers.
 *
 * A marker looks like `⟦TAG_3⟧`: mathematical white square brackets around
 * an uppercase category label and a sequence number. The brackets are
 * reserved; ordinary prose and markup do not use them, so a marker cannot
 * be confused with source text.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::catalog::SpanCategory;

/// Opening bracket of every marker
pub const MARKER_OPEN: char = '⟦';

/// Closing bracket of every marker
pub const MARKER_CLOSE: char = '⟧';

/// Regex matching any marker-shaped token
pub static MARKER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"⟦([A-Z]+)_([0-9]+)⟧").expect("Invalid marker regex"));

/// Marker standing in for one protected span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Placeholder {
    category: SpanCategory,
    sequence: usize,
    token: String,
}

impl Placeholder {
    /// Create the marker for a category and sequence number
    pub fn new(category: SpanCategory, sequence: usize) -> Self {
        Self {
            category,
            sequence,
            token: format!("{}{}_{}{}", MARKER_OPEN, category.label(), sequence, MARKER_CLOSE),
        }
    }

    /// Parse a marker token back into a placeholder
    pub fn parse(token: &str) -> Option<Self> {
        let caps = MARKER_REGEX.captures(token)?;
        if caps.get(0)?.as_str().len() != token.len() {
            return None;
        }
        let category = SpanCategory::from_label(&caps[1])?;
        let sequence = caps[2].parse().ok()?;
        Some(Self::new(category, sequence))
    }

    pub fn category(&self) -> SpanCategory {
        self.category
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// The marker text as it appears in protected text
    pub fn as_str(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}
