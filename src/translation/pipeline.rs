/*!
 * Protect, translate, review, restore.
 *
 * One call runs the full round trip for a single string:
 * 1. protect the source and build the constrained prompt
 * 2. ask the generator for a translation that still carries the markers
 * 3. optionally ask for a review, with markers still in place
 * 4. audit the markers and restore the originals
 * 5. score glossary adherence on the restored text
 */

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::app_config::Config;
use crate::errors::{FidelityReport, TranslationError};
use crate::evaluation::term_adherence;
use crate::glossary::GlossaryConstraint;
use crate::language_utils::get_language_name;
use crate::prompts::{
    PromptStyle, ReviewPromptBuilder, ReviewVerdict, TranslationPromptBuilder, parse_review_response,
};
use crate::protection::{ProtectionOptions, RestoreMode, SpanProtector, SpanRestorer};
use crate::providers::TextGenerator;

/// Settings for a translation pipeline
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Logical model name handed to the generator
    pub model: String,
    /// Target language as an English name, e.g. "French"
    pub target_language: String,
    /// Source language as an English name, if it should be stated
    pub source_language: Option<String>,
    pub protection: ProtectionOptions,
    pub restore_mode: RestoreMode,
    /// Run the quality-control review after translating
    pub review: bool,
    /// Maximum number of strings in flight in `translate_batch`
    pub concurrent_requests: usize,
    pub style: PromptStyle,
    pub custom_instructions: Option<String>,
}

impl PipelineOptions {
    pub fn new(model: &str, target_language: &str) -> Self {
        Self {
            model: model.to_string(),
            target_language: target_language.to_string(),
            source_language: None,
            protection: ProtectionOptions::default(),
            restore_mode: RestoreMode::default(),
            review: false,
            concurrent_requests: 4,
            style: PromptStyle::default(),
            custom_instructions: None,
        }
    }

    /// Options from configuration, with language codes turned into names
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            model: config.model.clone(),
            target_language: get_language_name(&config.target_language)?,
            source_language: Some(get_language_name(&config.source_language)?),
            protection: config.protection.options(),
            restore_mode: config.protection.restore_mode(),
            review: config.generation.review,
            concurrent_requests: config.generation.concurrent_requests.max(1),
            style: PromptStyle::default(),
            custom_instructions: None,
        })
    }
}

/// One string to translate with its constraints
#[derive(Debug, Clone, Default)]
pub struct TranslationRequest {
    pub source: String,
    pub constraints: Vec<GlossaryConstraint>,
}

impl TranslationRequest {
    pub fn new(source: impl Into<String>, constraints: Vec<GlossaryConstraint>) -> Self {
        Self {
            source: source.into(),
            constraints,
        }
    }
}

/// Result of one round trip
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    pub source: String,
    /// Final text with the protected spans restored
    pub translation: String,
    /// Model output with markers, after review
    pub raw_output: String,
    /// Marker problems found in `raw_output`
    pub fidelity: FidelityReport,
    /// Share of constraint targets found in `translation`
    pub adherence: f64,
    /// Reviewer verdict when the review pass ran
    pub review: Option<ReviewVerdict>,
}

/// Translation round trip around a `TextGenerator`
pub struct TranslationPipeline<G> {
    generator: G,
    protector: SpanProtector,
    restorer: SpanRestorer,
    options: PipelineOptions,
}

impl<G: TextGenerator> TranslationPipeline<G> {
    pub fn new(generator: G, options: PipelineOptions) -> Self {
        Self {
            generator,
            protector: SpanProtector::with_options(options.protection),
            restorer: SpanRestorer::new(options.restore_mode),
            options,
        }
    }

    /// Use a custom protector instead of the standard catalog
    pub fn with_protector(mut self, protector: SpanProtector) -> Self {
        self.protector = protector;
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    fn prompt_builder(&self, constraints: &[GlossaryConstraint]) -> TranslationPromptBuilder {
        let mut builder = TranslationPromptBuilder::new(&self.options.target_language)
            .with_constraints(constraints)
            .with_style(self.options.style);
        if let Some(source_language) = &self.options.source_language {
            builder = builder.with_source_language(source_language);
        }
        if let Some(custom) = &self.options.custom_instructions {
            builder = builder.with_custom_instructions(custom);
        }
        builder
    }

    /// Ask for a review and return the text to keep
    async fn review(
        &self,
        protected_source: &str,
        candidate: String,
        constraints: &[GlossaryConstraint],
        restoration: &crate::protection::RestorationMap,
    ) -> Result<(String, ReviewVerdict), TranslationError> {
        let mut builder = ReviewPromptBuilder::new(&self.options.target_language)
            .with_constraints(constraints)
            .with_style(self.options.style);
        if let Some(source_language) = &self.options.source_language {
            builder = builder.with_source_language(source_language);
        }
        let messages = builder.build(protected_source, &candidate);
        let reply = self.generator.generate(&self.options.model, &messages).await?;

        let verdict = parse_review_response(&reply);
        match &verdict {
            ReviewVerdict::Approved => Ok((candidate, verdict)),
            ReviewVerdict::Corrected(corrected) => {
                if restoration.audit(&candidate).is_clean() && !restoration.audit(corrected).is_clean() {
                    warn!("Review correction damaged the markers; keeping the original candidate");
                    return Ok((candidate, verdict));
                }
                debug!("Review replaced the candidate translation");
                Ok((corrected.clone(), verdict))
            }
        }
    }

    /// Translate one string
    pub async fn translate(
        &self,
        source: &str,
        constraints: &[GlossaryConstraint],
    ) -> Result<TranslationOutcome, TranslationError> {
        if source.trim().is_empty() {
            debug!("Blank source kept as is without a model call");
            return Ok(TranslationOutcome {
                source: source.to_string(),
                translation: source.to_string(),
                raw_output: source.to_string(),
                fidelity: FidelityReport::default(),
                adherence: term_adherence(source, constraints),
                review: None,
            });
        }

        let prepared = self.prompt_builder(constraints).build(&self.protector, source);
        debug!(
            "Prepared prompt with {} protected spans and {} constraints",
            prepared.restoration.len(),
            constraints.len()
        );

        let mut candidate = self
            .generator
            .generate(&self.options.model, &prepared.messages)
            .await?;
        if !source.ends_with('\n') {
            let trimmed_len = candidate.trim_end_matches(['\n', '\r']).len();
            candidate.truncate(trimmed_len);
        }

        let mut review = None;
        if self.options.review {
            let (kept, verdict) = self
                .review(&prepared.protected_source, candidate, constraints, &prepared.restoration)
                .await?;
            candidate = kept;
            review = Some(verdict);
        }

        let fidelity = prepared.restoration.audit(&candidate);
        if !fidelity.is_clean() {
            warn!("Translation damaged placeholders: {}", fidelity);
        }

        let translation = self.restorer.restore(&candidate, &prepared.restoration)?;
        let adherence = term_adherence(&translation, constraints);

        Ok(TranslationOutcome {
            source: source.to_string(),
            translation,
            raw_output: candidate,
            fidelity,
            adherence,
            review,
        })
    }

    /// Translate many strings concurrently, results in input order
    pub async fn translate_batch(
        &self,
        requests: &[TranslationRequest],
    ) -> Vec<Result<TranslationOutcome, TranslationError>> {
        self.translate_batch_with_progress(requests, |_, _| {}).await
    }

    /// Like `translate_batch`, calling `progress(done, total)` after each string
    pub async fn translate_batch_with_progress(
        &self,
        requests: &[TranslationRequest],
        progress: impl Fn(usize, usize) + Send + Sync,
    ) -> Vec<Result<TranslationOutcome, TranslationError>> {
        let total = requests.len();
        let done = AtomicUsize::new(0);
        let progress = &progress;
        let done = &done;

        let mut results = stream::iter(requests.iter().enumerate())
            .map(|(index, request)| async move {
                let result = self.translate(&request.source, &request.constraints).await;
                let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
                progress(finished, total);
                (index, result)
            })
            .buffer_unordered(self.options.concurrent_requests.max(1))
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let failures = results.iter().filter(|(_, r)| r.is_err()).count();
        info!("Translated {} strings ({} failed)", total - failures, failures);
        results.into_iter().map(|(_, result)| result).collect()
    }
}
