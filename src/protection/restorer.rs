/*!
 * Span restorer.
 *
 * Best-effort mode does literal substring replacement and never fails.
 * Strict mode audits the text first and then rebuilds it in a single
 * left-to-right pass over the markers it finds.
 */

use log::warn;
use regex::Captures;
use serde::{Deserialize, Serialize};

use super::map::RestorationMap;
use super::placeholder::MARKER_REGEX;
use crate::errors::RestoreError;

/// How to react when a translation damaged the markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreMode {
    /// Restore whatever can be restored, skip the rest
    #[default]
    BestEffort,
    /// Fail unless each placeholder occurs exactly once and nothing foreign appears
    Strict,
}

/// Puts protected spans back into translated text
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanRestorer {
    mode: RestoreMode,
}

impl SpanRestorer {
    pub fn new(mode: RestoreMode) -> Self {
        Self { mode }
    }

    pub fn best_effort() -> Self {
        Self::new(RestoreMode::BestEffort)
    }

    pub fn strict() -> Self {
        Self::new(RestoreMode::Strict)
    }

    pub fn mode(&self) -> RestoreMode {
        self.mode
    }

    /// Restore `text` using `map`. Only strict mode can return an error.
    pub fn restore(&self, text: &str, map: &RestorationMap) -> Result<String, RestoreError> {
        match self.mode {
            RestoreMode::BestEffort => Ok(map.restore(text)),
            RestoreMode::Strict => {
                let report = map.audit(text);
                if !report.is_clean() {
                    warn!("Strict restoration rejected the text: {}", report);
                    return Err(RestoreError::Fidelity(report));
                }
                let restored = MARKER_REGEX.replace_all(text, |caps: &Captures<'_>| {
                    let token = &caps[0];
                    map.original(token).unwrap_or(token).to_string()
                });
                Ok(restored.into_owned())
            }
        }
    }
}
