use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::services::comparison::ComparisonMode;
use crate::services::genai;
use crate::services::validation::MatchPolicy;

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Gemini API key
    pub genai_api_key: String,

    /// Generative Language API base URL
    #[serde(default = "default_genai_base_url")]
    pub genai_base_url: String,

    /// Vision model used for label OCR
    #[serde(default = "default_model")]
    pub ocr_model: String,

    /// Model used for the schema-constrained verdict call
    #[serde(default = "default_model")]
    pub validation_model: String,

    /// Upper bound for each external AI call, in seconds
    #[serde(default = "default_ai_timeout_secs", deserialize_with = "nonzero_secs")]
    pub ai_timeout_secs: u64,

    /// `model` or `rules`
    #[serde(default)]
    pub comparison_mode: ComparisonMode,

    #[serde(default)]
    pub match_case_insensitive: bool,

    #[serde(default)]
    pub match_collapse_whitespace: bool,

    /// Largest accepted request body, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_genai_base_url() -> String {
    genai::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn nonzero_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(serde::de::Error::custom("ai_timeout_secs must be at least 1"));
    }
    Ok(secs)
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy {
            case_insensitive: self.match_case_insensitive,
            collapse_whitespace: self.match_collapse_whitespace,
        }
    }
}
