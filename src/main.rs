use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tracesmart_label_verify::app_state::{AppState, LabelPipeline, PipelineInfo};
use tracesmart_label_verify::config::AppConfig;
use tracesmart_label_verify::routes;
use tracesmart_label_verify::services::comparison::{
    ComparisonMode, ConfiguredComparator, ModelComparator,
};
use tracesmart_label_verify::services::genai::GeminiClient;
use tracesmart_label_verify::services::ocr::GeminiTextExtractor;
use tracesmart_label_verify::services::validation::RuleComparator;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing tracesmart-label-verify server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    metrics::describe_counter!(
        "label_validations_total",
        "Label validations by outcome"
    );
    metrics::describe_histogram!(
        "label_validation_seconds",
        "End-to-end time to validate one label"
    );
    metrics::describe_histogram!(
        "label_ocr_seconds",
        "Time spent extracting text from a label image"
    );

    tracing::info!(base_url = %config.genai_base_url, "Initializing Gemini client");
    let client = Arc::new(
        GeminiClient::new(&config.genai_base_url, &config.genai_api_key)
            .expect("Failed to initialize Gemini client"),
    );

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

    let info = PipelineInfo {
        comparison_mode: comparator.mode(),
        ocr_model: extractor.model().to_string(),
        validation_model: match &comparator {
            ConfiguredComparator::Model(model) => Some(model.model().to_string()),
            ConfiguredComparator::Rules(_) => None,
        },
        ai_timeout_secs: config.ai_timeout_secs,
    };
    tracing::info!(
        comparison_mode = %info.comparison_mode,
        ocr_model = %info.ocr_model,
        timeout_secs = info.ai_timeout_secs,
        "Validation pipeline configured"
    );

    let pipeline: LabelPipeline =
        LabelPipeline::new(extractor, comparator, config.ai_timeout());
    let state = AppState::new(pipeline, info);

    let app = Router::new()
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .merge(routes::api_router(state, config.max_upload_bytes));

    tracing::info!("Starting tracesmart-label-verify on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
