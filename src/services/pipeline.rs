//! Label validation orchestrator.
//!
//! Sequences text extraction and field comparison, and folds every failure into an
//! invalid [`ValidationResponse`] so callers always receive a verdict:
//!
//! 1. Request validation (schema + data URI decoding)
//! 2. Text extraction; empty text short-circuits with an OCR failure
//! 3. Field comparison; its output is passed through unchanged

use std::future::Future;
use std::time::{Duration, Instant};

use garde::Validate;
use strum::Display;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::label::{ExpectedFields, ValidationResponse};
use crate::models::verification::ValidationRequest;
use crate::services::genai::GenAiError;
use crate::services::image::LabelImage;

pub const OCR_FAILED: &str = "AI failed to extract any text from the label image (OCR failed).";
pub const EMPTY_OUTPUT: &str =
    "AI model failed to generate a valid validation response. The result was empty.";
pub const SCHEMA_FAILED: &str = "AI failed to produce a correctly formatted JSON response. It may have returned text instead of the required JSON structure.";

/// Transcribes the visible text of a label image.
pub trait TextExtractor: Send + Sync {
    /// `Ok(None)` or blank text means nothing could be read from the image.
    fn extract_text(
        &self,
        image: &LabelImage,
    ) -> impl Future<Output = Result<Option<String>, GenAiError>> + Send;
}

/// Decides whether extracted label text carries the expected fields.
pub trait FieldComparator: Send + Sync {
    fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> impl Future<Output = Result<ValidationResponse, PipelineError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PipelineStep {
    #[strum(serialize = "text extraction")]
    TextExtraction,
    #[strum(serialize = "field comparison")]
    FieldComparison,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid validation request: {0}")]
    InvalidRequest(String),

    #[error("text extraction returned no text")]
    OcrEmpty,

    #[error("field comparison returned no output")]
    EmptyOutput,

    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("{step} timed out after {after:?}")]
    Timeout { step: PipelineStep, after: Duration },

    #[error(transparent)]
    GenAi(#[from] GenAiError),
}

impl PipelineError {
    /// Caller-facing explanation for an invalid verdict caused by this failure.
    pub fn explanation(&self) -> String {
        match self {
            PipelineError::InvalidRequest(reason) => format!("Invalid validation request: {reason}"),
            PipelineError::OcrEmpty => OCR_FAILED.to_string(),
            PipelineError::EmptyOutput => EMPTY_OUTPUT.to_string(),
            PipelineError::SchemaValidation(_) => SCHEMA_FAILED.to_string(),
            PipelineError::Timeout { .. } | PipelineError::GenAi(_) => {
                let message = self.to_string();
                let message = if message.trim().is_empty() {
                    "Unknown error"
                } else {
                    message.as_str()
                };
                format!("An unexpected error occurred during AI validation: {message}")
            }
        }
    }

    /// Metrics label for this failure class.
    pub fn outcome(&self) -> &'static str {
        match self {
            PipelineError::InvalidRequest(_) => "invalid_request",
            PipelineError::OcrEmpty => "ocr_failure",
            PipelineError::EmptyOutput => "empty_output",
            PipelineError::SchemaValidation(_) => "schema_failure",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::GenAi(_) => "transport_failure",
        }
    }
}

/// Two-step label validation pipeline. Holds no per-call state, so one instance
/// serves concurrent validations.
pub struct ValidationPipeline<E, C> {
    extractor: E,
    comparator: C,
    step_timeout: Duration,
}

impl<E, C> ValidationPipeline<E, C>
where
    E: TextExtractor,
    C: FieldComparator,
{
    pub fn new(extractor: E, comparator: C, step_timeout: Duration) -> Self {
        Self {
            extractor,
            comparator,
            step_timeout,
        }
    }

    /// Validate one label. Never fails: every failure becomes `isValid = false`
    /// with an explanation naming its class.
    pub async fn validate(&self, request: &ValidationRequest) -> ValidationResponse {
        let span = info_span!(
            "validate_label",
            validation_id = %Uuid::new_v4(),
            device_id = %request.expected.device_id,
        );

        async {
            let start = Instant::now();
            let (response, outcome) = match self.run(request).await {
                Ok(response) => {
                    let outcome = if response.is_valid { "valid" } else { "mismatch" };
                    (response, outcome)
                }
                Err(e) => {
                    warn!(error = %e, outcome = e.outcome(), "Label validation failed");
                    (ValidationResponse::invalid(e.explanation()), e.outcome())
                }
            };

            let elapsed = start.elapsed();
            metrics::counter!("label_validations_total", "outcome" => outcome).increment(1);
            metrics::histogram!("label_validation_seconds").record(elapsed.as_secs_f64());

            info!(
                is_valid = response.is_valid,
                outcome,
                duration_ms = elapsed.as_millis() as u64,
                "Label validation complete"
            );

            response
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &ValidationRequest) -> Result<ValidationResponse, PipelineError> {
        request
            .validate()
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;
        let image = LabelImage::from_data_uri(&request.label_image_uri)
            .map_err(|e| PipelineError::InvalidRequest(e.to_string()))?;

        let ocr_start = Instant::now();
        let extracted = self
            .bounded(PipelineStep::TextExtraction, self.extractor.extract_text(&image))
            .await?;
        metrics::histogram!("label_ocr_seconds").record(ocr_start.elapsed().as_secs_f64());

        let text = match extracted {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Err(PipelineError::OcrEmpty),
        };

        info!(
            text_len = text.len(),
            ocr_duration_ms = ocr_start.elapsed().as_millis() as u64,
            "Label text extracted"
        );

        self.bounded(
            PipelineStep::FieldComparison,
            self.comparator.compare(&request.expected, &text),
        )
        .await
    }

    async fn bounded<T, StepErr>(
        &self,
        step: PipelineStep,
        call: impl Future<Output = Result<T, StepErr>>,
    ) -> Result<T, PipelineError>
    where
        PipelineError: From<StepErr>,
    {
        match tokio::time::timeout(self.step_timeout, call).await {
            Ok(result) => result.map_err(PipelineError::from),
            Err(_) => Err(PipelineError::Timeout {
                step,
                after: self.step_timeout,
            }),
        }
    }
}
