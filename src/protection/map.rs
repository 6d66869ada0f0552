/*!
 * Restoration map: the ordered record of which marker replaced which text.
 */

use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use super::placeholder::{MARKER_REGEX, Placeholder};
use crate::errors::FidelityReport;

/// One (placeholder, original text) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestorationEntry {
    pub placeholder: Placeholder,
    pub original: String,
}

/// Ordered (placeholder, original) pairs in discovery order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RestorationMap {
    entries: Vec<RestorationEntry>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Marker-shaped text that was already in the source, with its count
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    literals: HashMap<String, usize>,
}

impl RestorationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, placeholder: Placeholder, original: impl Into<String>) {
        self.index
            .insert(placeholder.as_str().to_string(), self.entries.len());
        self.entries.push(RestorationEntry {
            placeholder,
            original: original.into(),
        });
    }

    /// Remember marker-shaped text of the source so audits accept it
    pub(crate) fn record_literals(&mut self, source: &str) {
        for found in MARKER_REGEX.find_iter(source) {
            *self.literals.entry(found.as_str().to_string()).or_insert(0) += 1;
        }
    }

    /// How often `token` occurred literally in the source
    pub fn literal_count(&self, token: &str) -> usize {
        self.literals.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RestorationEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RestorationEntry> {
        self.entries.iter()
    }

    /// Original text behind a marker token, if the token belongs to this map
    pub fn original(&self, token: &str) -> Option<&str> {
        self.index
            .get(token)
            .map(|&i| self.entries[i].original.as_str())
    }

    /// Best-effort restoration.
    ///
    /// Every occurrence of every placeholder is replaced by its original text.
    /// Placeholders missing from `text` are skipped.
    pub fn restore(&self, text: &str) -> String {
        let mut restored = text.to_string();
        let mut skipped = 0usize;
        for entry in &self.entries {
            let token = entry.placeholder.as_str();
            if restored.contains(token) {
                restored = restored.replace(token, &entry.original);
            } else {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(
                "{} of {} placeholders were absent from the text and could not be restored",
                skipped,
                self.entries.len()
            );
        }
        restored
    }

    /// Check that each placeholder occurs exactly once and no foreign marker appears.
    ///
    /// Marker-shaped literals of the source are not foreign, up to the number
    /// of times the source contained them.
    pub fn audit(&self, text: &str) -> FidelityReport {
        let mut report = FidelityReport::default();

        for entry in &self.entries {
            let token = entry.placeholder.as_str();
            match text.matches(token).count() {
                0 => report.missing.push(token.to_string()),
                1 => {}
                _ => report.duplicated.push(token.to_string()),
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for found in MARKER_REGEX.find_iter(text) {
            let token = found.as_str();
            if self.index.contains_key(token) {
                continue;
            }
            let count = seen.entry(token).or_insert(0);
            *count += 1;
            if *count > self.literal_count(token) && !report.unexpected.iter().any(|t| t == token) {
                report.unexpected.push(token.to_string());
            }
        }

        debug!(
            "Placeholder audit: expected={}, missing={}, duplicated={}, unexpected={}",
            self.entries.len(),
            report.missing.len(),
            report.duplicated.len(),
            report.unexpected.len()
        );

        report
    }
}

impl<'a> IntoIterator for &'a RestorationMap {
    type Item = &'a RestorationEntry;
    type IntoIter = std::slice::Iter<'a, RestorationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
