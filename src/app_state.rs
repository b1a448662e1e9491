use std::sync::Arc;

use serde::Serialize;

use crate::services::comparison::{ComparisonMode, ConfiguredComparator};
use crate::services::ocr::GeminiTextExtractor;
use crate::services::pipeline::ValidationPipeline;

/// The production pipeline: Gemini OCR plus the configured comparator.
pub type LabelPipeline = ValidationPipeline<GeminiTextExtractor, ConfiguredComparator>;

/// Static description of how the pipeline is wired, reported by `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineInfo {
    pub comparison_mode: ComparisonMode,
    pub ocr_model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_model: Option<String>,
    pub ai_timeout_secs: u64,
}

/// Shared application state passed to all route handlers.
pub struct AppState<E, C> {
    pub pipeline: Arc<ValidationPipeline<E, C>>,
    pub info: Arc<PipelineInfo>,
}

impl<E, C> AppState<E, C> {
    pub fn new(pipeline: ValidationPipeline<E, C>, info: PipelineInfo) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            info: Arc::new(info),
        }
    }
}

impl<E, C> Clone for AppState<E, C> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            info: Arc::clone(&self.info),
        }
    }
}
