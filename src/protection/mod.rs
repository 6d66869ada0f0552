/*!
 * Span protection engine.
 *
 * Finds sub-spans that must survive translation untouched (markup,
 * placeholders, code, entities, numeric tokens), swaps them for opaque
 * markers and puts them back afterwards.
 *
 * - `catalog`: the patterns, grouped by pass and category
 * - `placeholder`: marker syntax
 * - `map`: the restoration map produced by a protection call
 * - `protector`: the multi-pass protector
 * - `restorer`: best-effort and strict restoration
 */

pub mod catalog;
pub mod map;
pub mod placeholder;
pub mod protector;
pub mod restorer;

pub use catalog::{PatternCatalog, PatternCatalogBuilder, SpanCategory};
pub use map::{RestorationEntry, RestorationMap};
pub use placeholder::{MARKER_CLOSE, MARKER_OPEN, Placeholder};
pub use protector::{ProtectedText, ProtectionOptions, Span, SpanProtector};
pub use restorer::{RestoreMode, SpanRestorer};

/// Protect `text` with the standard catalog and default options
pub fn protect(text: &str) -> ProtectedText {
    SpanProtector::default().protect(text)
}

/// Best-effort restoration of `text`
pub fn restore(text: &str, map: &RestorationMap) -> String {
    map.restore(text)
}
