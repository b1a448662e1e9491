use std::sync::Arc;

use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::label::{ExpectedFields, ValidationResponse, ALL_CORRECT};
use crate::services::genai::{Content, GeminiClient, GenerateContentRequest, GenerationConfig, Part};
use crate::services::pipeline::{FieldComparator, PipelineError};
use crate::services::validation::RuleComparator;

const SYSTEM_INSTRUCTION: &str = "You are a Quality Control Inspector. Your function is to validate product labels by comparing extracted text to expected values and return a JSON object with the results.";

/// How the comparison step reaches its verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonMode {
    /// Schema-constrained generation call.
    #[default]
    Model,
    /// Local deterministic matching.
    Rules,
}

/// Output schema for the verdict call: `{isValid: BOOLEAN, validationResult: STRING}`.
pub fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "isValid": {
                "type": "BOOLEAN",
                "description": "Whether the label is valid and contains all the correct information matching the expected values."
            },
            "validationResult": {
                "type": "STRING",
                "description": "Detailed results of the label validation, including checks for each piece of information (Device ID, Batch ID, Manufacturing Date, RoHS Compliance, Serial Number) and any discrepancies found or confirmations of correctness."
            }
        },
        "required": ["isValid", "validationResult"],
        "propertyOrdering": ["isValid", "validationResult"]
    })
}

/// Prompt comparing the extracted text against the expected fields.
pub fn comparison_prompt(expected: &ExpectedFields, extracted_text: &str) -> String {
    let mut prompt = format!(
        "Compare the extracted text below against the expected information and validate the product label.\n\n\
         **Extracted Text from Label:**\n---\n{extracted_text}\n---\n\n\
         **Expected Information:**\n\
         - Device ID: {}\n\
         - Batch ID: {}\n\
         - Manufacturing Date: {}\n\
         - RoHS Compliant: {}\n",
        expected.device_id, expected.batch_id, expected.manufacturing_date, expected.rohs_compliance,
    );
    if let Some(serial) = &expected.serial_number {
        prompt.push_str(&format!("- Serial Number: {serial}\n"));
    }
    prompt.push_str(&format!(
        "\n**Instructions:**\n\
         - Text fields match only if the exact expected value appears in the extracted text.\n\
         - RoHS compliance matches if the label carries an affirmative marker (e.g. \"RoHS: Yes\", \"RoHS Compliant\") when expected is true, or a negative marker (e.g. \"RoHS: No\", \"Not RoHS Compliant\") when expected is false.\n\
         - If every single piece of expected information is present and matches the extracted text exactly, set `isValid` to `true` and `validationResult` to \"{ALL_CORRECT}\".\n\
         - If even one piece of information is missing, incorrect, or does not match, set `isValid` to `false` and create a `validationResult` string that details every field (e.g., \"Device ID: Correct. Batch ID: Missing. Serial Number: Found 'SN-123' instead of 'SN-456'.\").\n\n\
         Your final output must be ONLY the JSON object conforming to the output schema. Do not add any extra text or explanations.\n"
    ));
    prompt
}

pub fn comparison_request(expected: &ExpectedFields, extracted_text: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(vec![Part::Text(comparison_prompt(
            expected,
            extracted_text,
        ))])],
        system_instruction: Some(Content::system(SYSTEM_INSTRUCTION)),
        generation_config: Some(GenerationConfig {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(verdict_schema()),
            temperature: Some(0.0),
            ..Default::default()
        }),
    }
}

/// Enforce the verdict schema on raw model output.
///
/// Blank output is [`PipelineError::EmptyOutput`]; anything that is not a JSON
/// object with a boolean `isValid` and a non-empty string `validationResult` is
/// [`PipelineError::SchemaValidation`].
pub fn parse_verdict(raw: &str) -> Result<ValidationResponse, PipelineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::EmptyOutput);
    }

    let json = strip_code_fence(trimmed);
    let verdict: ValidationResponse = serde_json::from_str(json)
        .map_err(|e| PipelineError::SchemaValidation(e.to_string()))?;
    verdict
        .validate()
        .map_err(|e| PipelineError::SchemaValidation(e.to_string()))?;
    Ok(verdict)
}

/// Models sometimes wrap JSON output in a markdown fence.
fn strip_code_fence(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    let inner = inner
        .strip_prefix("json")
        .or_else(|| inner.strip_prefix("JSON"))
        .unwrap_or(inner);
    inner.trim()
}

/// Comparison through a schema-constrained Gemini call.
pub struct ModelComparator {
    client: Arc<GeminiClient>,
    model: String,
}

impl ModelComparator {
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

impl FieldComparator for ModelComparator {
    async fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        let request = comparison_request(expected, extracted_text);
        let output = self.client.generate(&self.model, &request).await?;
        let Some(output) = output else {
            tracing::error!(model = %self.model, "Model returned no output for validation");
            return Err(PipelineError::EmptyOutput);
        };
        parse_verdict(&output)
    }
}

/// The comparator selected by configuration.
pub enum ConfiguredComparator {
    Model(ModelComparator),
    Rules(RuleComparator),
}

impl ConfiguredComparator {
    pub fn mode(&self) -> ComparisonMode {
        match self {
            ConfiguredComparator::Model(_) => ComparisonMode::Model,
            ConfiguredComparator::Rules(_) => ComparisonMode::Rules,
        }
    }
}

impl FieldComparator for ConfiguredComparator {
    async fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        match self {
            ConfiguredComparator::Model(model) => model.compare(expected, extracted_text).await,
            ConfiguredComparator::Rules(rules) => rules.compare(expected, extracted_text).await,
        }
    }
}
