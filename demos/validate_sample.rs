//! Example: Validate a label against the sample catalog
//!
//! Runs the full pipeline (Gemini OCR plus the configured comparison step)
//! against a label image and the expected fields of one catalog product.
//!
//! Usage:
//!   cargo run --example validate_sample -- [path/to/label.png] [product-id]
//!
//! Prerequisites:
//!   - .env file with GENAI_API_KEY (COMPARISON_MODE optional)

use std::sync::Arc;

use tracesmart_label_verify::config::AppConfig;
use tracesmart_label_verify::models::product::sample_catalog;
use tracesmart_label_verify::services::comparison::{
    ComparisonMode, ConfiguredComparator, ModelComparator,
};
use tracesmart_label_verify::services::genai::GeminiClient;
use tracesmart_label_verify::services::image::LabelImage;
use tracesmart_label_verify::services::ocr::GeminiTextExtractor;
use tracesmart_label_verify::services::pipeline::ValidationPipeline;
use tracesmart_label_verify::services::validation::RuleComparator;

// 1x1 PNG; exercises connectivity and the OCR-failure path, not accuracy
const TEST_IMAGE_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    let mut args = std::env::args().skip(1);
    let image_uri = match args.next() {
        Some(path) => LabelImage::from_bytes(std::fs::read(&path)?)?.to_data_uri(),
        None => TEST_IMAGE_URI.to_string(),
    };
    let product_id = args.next().unwrap_or_else(|| "p1".to_string());

    let product = sample_catalog()
        .into_iter()
        .find(|p| p.id == product_id)
        .ok_or_else(|| format!("unknown product id: {product_id}"))?;

    println!("Label Validation Sample\n");
    println!("Configuration:");
    println!("   OCR model: {}", config.ocr_model);
    println!("   Comparison: {}", config.comparison_mode);
    println!("   Timeout: {:?}", config.ai_timeout());
    println!();
    println!("Expected label for {}:", product.id);
    for line in product.label_text().lines() {
        println!("   {line}");
    }
    match product.label_image_url() {
        Ok(url) => println!("   Rendered: {url}"),
        Err(e) => println!("   No label rendered: {e}"),
    }
    println!();

    let client = Arc::new(GeminiClient::new(&config.genai_base_url, &config.genai_api_key)?);
    let extractor = GeminiTextExtractor::new(Arc::clone(&client), &config.ocr_model);
    let comparator = match config.comparison_mode {
        ComparisonMode::Model => ConfiguredComparator::Model(ModelComparator::new(
            Arc::clone(&client),
            &config.validation_model,
        )),
        ComparisonMode::Rules => {
            ConfiguredComparator::Rules(RuleComparator::new(config.match_policy()))
        }
    };
    let pipeline = ValidationPipeline::new(extractor, comparator, config.ai_timeout());

    println!("Validating...");
    let response = pipeline
        .validate(&product.validation_request(image_uri))
        .await;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.is_valid {
        println!("\nLabel accepted.");
    } else {
        println!("\nLabel rejected.");
    }

    Ok(())
}
