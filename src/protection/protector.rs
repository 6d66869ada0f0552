/*!
 * Span protector.
 *
 * Protection runs as up to three sequential passes, each a pure
 * text-to-text transform:
 *
 * 1. markup pass over the input (tags, placeholders, code, entities)
 * 2. numeric pass over the output of pass 1
 * 3. plain-number pass over the output of pass 2
 *
 * Later passes only see literal text between markers: candidates that
 * overlap a marker are dropped. Sequence numbers keep counting across
 * passes so every marker of one call is unique.
 */

use log::debug;
use regex::Match;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::catalog::{PatternCatalog, SpanCategory};
use super::map::RestorationMap;
use super::placeholder::{MARKER_CLOSE, MARKER_OPEN, MARKER_REGEX, Placeholder};

/// Which optional passes to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionOptions {
    /// Protect currency, percentages, dates and times
    #[serde(default = "default_true")]
    pub numeric: bool,

    /// Protect every other standalone number
    #[serde(default)]
    pub plain_numbers: bool,
}

impl Default for ProtectionOptions {
    fn default() -> Self {
        Self {
            numeric: true,
            plain_numbers: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A protected region of the original text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Byte offset in the original text (inclusive)
    pub start: usize,
    /// Byte offset in the original text (exclusive)
    pub end: usize,
    pub category: SpanCategory,
    pub original: String,
}

/// Result of a protection call
#[derive(Debug, Clone, Serialize)]
pub struct ProtectedText {
    text: String,
    restoration: RestorationMap,
    spans: Vec<Span>,
}

impl ProtectedText {
    /// Text with every protected span replaced by its marker
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn restoration_map(&self) -> &RestorationMap {
        &self.restoration
    }

    /// Protected spans ordered by their position in the original text
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Split into the protected text and its restoration map
    pub fn into_parts(self) -> (String, RestorationMap) {
        (self.text, self.restoration)
    }

    /// Restore this text's own markers (a no-op round trip)
    pub fn restore(&self) -> String {
        self.restoration.restore(&self.text)
    }
}

/// A marker already present in the text a pass is scanning
struct MarkerSite {
    start: usize,
    end: usize,
    original_len: usize,
}

/// Bookkeeping shared by the passes of one call
struct PassState<'s> {
    source: &'s str,
    source_has_markers: bool,
    next_sequence: usize,
    restoration: RestorationMap,
    spans: Vec<Span>,
}

impl<'s> PassState<'s> {
    fn new(source: &'s str) -> Self {
        let source_has_markers = source.contains(MARKER_OPEN);
        let mut restoration = RestorationMap::new();
        if source_has_markers {
            restoration.record_literals(source);
        }
        Self {
            source,
            source_has_markers,
            next_sequence: 0,
            restoration,
            spans: Vec::new(),
        }
    }

    /// Next placeholder whose token does not already occur in the source
    fn next_placeholder(&mut self, category: SpanCategory) -> Placeholder {
        loop {
            let placeholder = Placeholder::new(category, self.next_sequence);
            self.next_sequence += 1;
            if !self.source_has_markers || !self.source.contains(placeholder.as_str()) {
                return placeholder;
            }
        }
    }

    /// Markers of this call that occur in `text`, in order
    fn marker_sites(&self, text: &str) -> Vec<MarkerSite> {
        MARKER_REGEX
            .find_iter(text)
            .filter_map(|m| {
                self.restoration.original(m.as_str()).map(|original| MarkerSite {
                    start: m.start(),
                    end: m.end(),
                    original_len: original.len(),
                })
            })
            .collect()
    }

    /// Replace `found` ranges of `input` with fresh markers.
    ///
    /// `found` must be sorted and non-overlapping, and must not overlap `sites`.
    fn splice(
        &mut self,
        input: &str,
        found: &[(usize, usize, SpanCategory)],
        sites: &[MarkerSite],
    ) -> String {
        let mut output = String::with_capacity(input.len() + found.len() * 8);
        let mut cursor = 0usize;
        let mut site_index = 0usize;
        // Bytes of markers before the current match, and of the text they stand for
        let mut marker_bytes = 0usize;
        let mut original_bytes = 0usize;

        for &(start, end, category) in found {
            while site_index < sites.len() && sites[site_index].end <= start {
                marker_bytes += sites[site_index].end - sites[site_index].start;
                original_bytes += sites[site_index].original_len;
                site_index += 1;
            }

            let original = &input[start..end];
            let original_start = start + original_bytes - marker_bytes;
            let placeholder = self.next_placeholder(category);

            output.push_str(&input[cursor..start]);
            output.push_str(placeholder.as_str());
            cursor = end;

            self.spans.push(Span {
                start: original_start,
                end: original_start + original.len(),
                category,
                original: original.to_string(),
            });
            self.restoration.push(placeholder, original);
        }

        output.push_str(&input[cursor..]);
        output
    }
}

/// Replaces protected spans with placeholder markers
#[derive(Debug, Clone)]
pub struct SpanProtector {
    catalog: Arc<PatternCatalog>,
    options: ProtectionOptions,
}

impl Default for SpanProtector {
    fn default() -> Self {
        Self::new(PatternCatalog::standard(), ProtectionOptions::default())
    }
}

impl SpanProtector {
    pub fn new(catalog: Arc<PatternCatalog>, options: ProtectionOptions) -> Self {
        Self { catalog, options }
    }

    /// Standard catalog with the given options
    pub fn with_options(options: ProtectionOptions) -> Self {
        Self::new(PatternCatalog::standard(), options)
    }

    pub fn options(&self) -> ProtectionOptions {
        self.options
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Protect every span the catalog recognises in `text`
    pub fn protect(&self, text: &str) -> ProtectedText {
        let mut state = PassState::new(text);

        let mut current = self.markup_pass(text, &mut state);
        let after_markup = state.restoration.len();

        if self.options.numeric {
            current = self.numeric_pass(&current, &mut state);
        }
        let after_numeric = state.restoration.len();

        if self.options.plain_numbers {
            current = self.plain_number_pass(&current, &mut state);
        }

        debug!(
            "Protected {} spans (markup={}, numeric={}, plain={}) in {} bytes",
            state.restoration.len(),
            after_markup,
            after_numeric - after_markup,
            state.restoration.len() - after_numeric,
            text.len()
        );

        let mut spans = state.spans;
        spans.sort_by_key(|span| span.start);

        ProtectedText {
            text: current,
            restoration: state.restoration,
            spans,
        }
    }

    fn markup_pass(&self, input: &str, state: &mut PassState<'_>) -> String {
        let found: Vec<(usize, usize, SpanCategory)> = self
            .catalog
            .markup()
            .captures_iter(input)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                if whole.as_str().is_empty() {
                    return None;
                }
                Some((whole.start(), whole.end(), self.catalog.classify(&caps)))
            })
            .collect();

        state.splice(input, &found, &[])
    }

    fn numeric_pass(&self, input: &str, state: &mut PassState<'_>) -> String {
        let sites = state.marker_sites(input);
        let found: Vec<(usize, usize, SpanCategory)> = self
            .catalog
            .numeric()
            .find_iter(input)
            .filter(|m| !m.as_str().is_empty() && !overlaps_marker(m, &sites))
            .map(|m| (m.start(), m.end(), SpanCategory::Numeric))
            .collect();

        state.splice(input, &found, &sites)
    }

    fn plain_number_pass(&self, input: &str, state: &mut PassState<'_>) -> String {
        let sites = state.marker_sites(input);
        let found: Vec<(usize, usize, SpanCategory)> = self
            .catalog
            .plain_number()
            .find_iter(input)
            .filter(|m| {
                !m.as_str().is_empty()
                    && !overlaps_marker(m, &sites)
                    && !touches_percent_or_marker(input, m)
            })
            .map(|m| (m.start(), m.end(), SpanCategory::PlainNumber))
            .collect();

        state.splice(input, &found, &sites)
    }
}

fn overlaps_marker(candidate: &Match<'_>, sites: &[MarkerSite]) -> bool {
    sites
        .iter()
        .any(|site| candidate.start() < site.end && site.start < candidate.end())
}

/// Numbers directly followed by '%' or glued to a marker bracket stay unprotected
fn touches_percent_or_marker(text: &str, candidate: &Match<'_>) -> bool {
    let next = text[candidate.end()..].chars().next();
    let previous = text[..candidate.start()].chars().next_back();
    matches!(next, Some('%') | Some(MARKER_OPEN)) || previous == Some(MARKER_CLOSE)
}
