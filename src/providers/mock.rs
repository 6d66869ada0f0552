/*!
 * Mock generator and embedder for testing.
 *
 * The generator reads the protected source out of the prompt it receives
 * and answers according to its behaviour:
 * - `MockGenerator::working()` - applies its word replacements, keeps markers
 * - `MockGenerator::echo()` - returns the protected source unchanged
 * - `MockGenerator::dropping()` - loses the last marker
 * - `MockGenerator::duplicating()` - repeats the first marker
 * - `MockGenerator::failing()` - always errors
 * - `MockGenerator::intermittent(n)` - fails every nth request
 *
 * Review requests are answered with `NO_CHANGES` unless a correction is
 * configured.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ChatMessage, Embedder, TextGenerator};
use crate::errors::{ModelError, ProviderError};
use crate::prompts::{CANDIDATE_HEADER, NO_CHANGES, SOURCE_HEADER};
use crate::protection::placeholder::MARKER_REGEX;

/// Behavior mode for the mock generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Applies the configured replacements and keeps every marker
    Working,
    /// Returns the protected source as-is
    Echo,
    /// Drops the last marker of the source
    DropLastMarker,
    /// Repeats the first marker of the source
    DuplicateFirstMarker,
    /// Fails every nth request
    Intermittent { fail_every: usize },
    /// Always fails
    Failing,
}

/// Scripted `TextGenerator`
#[derive(Debug, Clone)]
pub struct MockGenerator {
    behavior: MockBehavior,
    replacements: Vec<(String, String)>,
    review_reply: Option<String>,
    request_count: Arc<AtomicUsize>,
    calls: Arc<Mutex<Vec<(String, Vec<ChatMessage>)>>>,
}

impl MockGenerator {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            replacements: Vec::new(),
            review_reply: None,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    pub fn dropping() -> Self {
        Self::new(MockBehavior::DropLastMarker)
    }

    pub fn duplicating() -> Self {
        Self::new(MockBehavior::DuplicateFirstMarker)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Replace `from` with `to` when "translating"
    pub fn with_replacement(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.replacements.push((from.into(), to.into()));
        self
    }

    /// Answer review requests with this text instead of `NO_CHANGES`
    pub fn with_review_reply(mut self, reply: impl Into<String>) -> Self {
        self.review_reply = Some(reply.into());
        self
    }

    /// Number of `generate` calls so far, shared between clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Every (model, messages) pair received so far
    pub fn calls(&self) -> Vec<(String, Vec<ChatMessage>)> {
        self.calls.lock().clone()
    }

    /// The protected source embedded in a translation prompt
    pub fn extract_source(messages: &[ChatMessage]) -> String {
        let content = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
        let header = format!("{}\n", SOURCE_HEADER);
        match content.rfind(&header) {
            Some(pos) => content[pos + header.len()..].trim_end().to_string(),
            None => content.trim_end().to_string(),
        }
    }

    fn translate(&self, source: &str) -> String {
        let mut text = source.to_string();
        match self.behavior {
            MockBehavior::Echo => return text,
            MockBehavior::DropLastMarker => {
                if let Some(last) = MARKER_REGEX.find_iter(source).last() {
                    text.replace_range(last.range(), "");
                }
            }
            MockBehavior::DuplicateFirstMarker => {
                if let Some(first) = MARKER_REGEX.find(source) {
                    text.push(' ');
                    text.push_str(first.as_str());
                }
            }
            _ => {}
        }
        for (from, to) in &self.replacements {
            text = text.replace(from.as_str(), to);
        }
        text
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, model: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push((model.to_string(), messages.to_vec()));

        match self.behavior {
            MockBehavior::Failing => {
                return Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "Simulated provider failure".to_string(),
                }
                .into());
            }
            MockBehavior::Intermittent { fail_every } if count % fail_every == fail_every - 1 => {
                return Err(ProviderError::ApiError {
                    status_code: 503,
                    message: format!("Simulated intermittent failure (request #{})", count + 1),
                }
                .into());
            }
            _ => {}
        }

        let is_review = messages.iter().any(|m| m.content.contains(CANDIDATE_HEADER));
        if is_review {
            return Ok(self.review_reply.clone().unwrap_or_else(|| NO_CHANGES.to_string()));
        }

        Ok(self.translate(&Self::extract_source(messages)))
    }
}

/// Bag-of-words embedder over a fixed vocabulary
///
/// Each vector component counts case-insensitive occurrences of one
/// vocabulary word, which is enough to make cosine ranking predictable.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    vocabulary: Vec<String>,
    calls: Arc<AtomicUsize>,
}

impl MockEmbedder {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(|w| w.into().to_lowercase()).collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `embed` calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|word| lower.matches(word.as_str()).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }
}
