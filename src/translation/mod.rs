/*!
 * Translation orchestration around the span protection engine.
 */

pub mod pipeline;

pub use pipeline::{
    PipelineOptions, TranslationOutcome, TranslationPipeline, TranslationRequest,
};
