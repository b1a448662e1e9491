use std::sync::Arc;

use crate::services::genai::{
    Content, GeminiClient, GenAiError, GenerateContentRequest, GenerationConfig, Part,
};
use crate::services::image::LabelImage;
use crate::services::pipeline::TextExtractor;

const OCR_INSTRUCTION: &str =
    "Extract all visible text from this product label image. Present the text clearly.";

/// Label OCR through a Gemini vision model.
pub struct GeminiTextExtractor {
    client: Arc<GeminiClient>,
    model: String,
}

impl GeminiTextExtractor {
    pub fn new(client: Arc<GeminiClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Multimodal request: label image plus transcription instruction, text-only output.
pub fn ocr_request(image: &LabelImage) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![
            Part::image(image),
            Part::Text(OCR_INSTRUCTION.to_string()),
        ])],
        system_instruction: None,
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["TEXT".to_string()]),
            ..Default::default()
        }),
    }
}

impl TextExtractor for GeminiTextExtractor {
    async fn extract_text(&self, image: &LabelImage) -> Result<Option<String>, GenAiError> {
        tracing::debug!(
            model = %self.model,
            mime_type = image.mime_type(),
            image_bytes = image.bytes().len(),
            "Requesting label OCR"
        );
        self.client.generate(&self.model, &ocr_request(image)).await
    }
}
