/*!
 * Glossary constraints and embedding-based retrieval.
 *
 * Each glossary row becomes a short text document; the source string and
 * the documents are embedded, ranked by cosine similarity, and the best
 * rows are turned into `GlossaryConstraint`s for the prompt.
 */

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::errors::ProviderError;
use crate::providers::Embedder;

/// One enforced term translation, as consumed by the prompt builder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryConstraint {
    /// Term as it appears in the source language
    pub term_src: String,
    /// Required translation in the target language
    pub target: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub notes: String,
}

impl GlossaryConstraint {
    pub fn new(term_src: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            term_src: term_src.into(),
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// One glossary row
///
/// Target forms live in per-language columns keyed by language code
/// (`"fr": "Passer la commande"`), flattened next to the fixed fields.
/// Exported sheets often carry `null` cells and extra columns such as a
/// numeric `id`; those load fine and only string cells count as targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub part_of_speech: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub domain: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub definition: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub notes: String,
    #[serde(flatten)]
    pub targets: BTreeMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl GlossaryEntry {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, lang: impl Into<String>, target: impl Into<String>) -> Self {
        self.targets.insert(lang.into(), Value::String(target.into()));
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_part_of_speech(mut self, pos: impl Into<String>) -> Self {
        self.part_of_speech = pos.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Target form for a language column, empty when the cell is absent or not text
    pub fn target(&self, lang: &str) -> &str {
        self.targets.get(lang).and_then(Value::as_str).unwrap_or("")
    }
}

/// Render every row as a retrieval document for `target_lang`
pub fn build_glossary_corpus(entries: &[GlossaryEntry], target_lang: &str) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            format!(
                "term: {}\npos: {}\ndomain: {}\ndefinition: {}\ntarget_{}: {}\n",
                e.term,
                e.part_of_speech,
                e.domain,
                e.definition,
                target_lang,
                e.target(target_lang)
            )
        })
        .collect()
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Indices of the `k` documents most similar to `query`, best first
///
/// Ties keep document order.
pub fn best_k_terms(query: &[f32], documents: &[Vec<f32>], k: usize) -> Vec<usize> {
    let mut scored: Vec<(usize, f32)> = documents
        .iter()
        .enumerate()
        .map(|(i, d)| (i, cosine_similarity(query, d)))
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.into_iter().take(k).map(|(i, _)| i).collect()
}

/// Turn selected rows into constraints for `target_lang`
pub fn select_constraints(
    entries: &[GlossaryEntry],
    indices: &[usize],
    target_lang: &str,
) -> Vec<GlossaryConstraint> {
    indices
        .iter()
        .filter_map(|&i| entries.get(i))
        .map(|e| GlossaryConstraint {
            term_src: e.term.clone(),
            target: e.target(target_lang).to_string(),
            definition: e.definition.clone(),
            notes: e.notes.clone(),
        })
        .collect()
}

/// Ranks glossary rows against source strings with an `Embedder`
///
/// Document vectors are computed on first use and reused afterwards.
pub struct GlossaryRetriever<E> {
    embedder: E,
    entries: Vec<GlossaryEntry>,
    target_lang: String,
    documents: Vec<String>,
    top_k: usize,
    document_vectors: RwLock<Option<Vec<Vec<f32>>>>,
}

impl<E: Embedder> GlossaryRetriever<E> {
    pub fn new(embedder: E, entries: Vec<GlossaryEntry>, target_lang: impl Into<String>) -> Self {
        let target_lang = target_lang.into();
        let documents = build_glossary_corpus(&entries, &target_lang);
        Self {
            embedder,
            entries,
            target_lang,
            documents,
            top_k: 3,
            document_vectors: RwLock::new(None),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn entries(&self) -> &[GlossaryEntry] {
        &self.entries
    }

    async fn document_vectors(&self) -> Result<Vec<Vec<f32>>, ProviderError> {
        if let Some(vectors) = self.document_vectors.read().as_ref() {
            return Ok(vectors.clone());
        }
        let vectors = self.embedder.embed(&self.documents).await?;
        if vectors.len() != self.documents.len() {
            return Err(ProviderError::ParseError(format!(
                "Expected {} glossary embeddings, got {}",
                self.documents.len(),
                vectors.len()
            )));
        }
        *self.document_vectors.write() = Some(vectors.clone());
        Ok(vectors)
    }

    /// The `top_k` constraints most relevant to `source`
    pub async fn retrieve(&self, source: &str) -> Result<Vec<GlossaryConstraint>, ProviderError> {
        if self.entries.is_empty() || self.top_k == 0 {
            return Ok(Vec::new());
        }
        let documents = self.document_vectors().await?;
        let query = self
            .embedder
            .embed(&[source.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("Embedder returned no query vector".to_string()))?;

        let indices = best_k_terms(&query, &documents, self.top_k);
        debug!("Selected glossary rows {:?} for a {}-byte source", indices, source.len());
        Ok(select_constraints(&self.entries, &indices, &self.target_lang))
    }
}
