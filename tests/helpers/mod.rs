//! Stub pipeline steps and server plumbing for tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Json, Router};

use tracesmart_label_verify::app_state::{AppState, PipelineInfo};
use tracesmart_label_verify::models::label::{ExpectedFields, ValidationResponse};
use tracesmart_label_verify::routes;
use tracesmart_label_verify::services::comparison::{parse_verdict, ComparisonMode};
use tracesmart_label_verify::services::genai::GenAiError;
use tracesmart_label_verify::services::image::LabelImage;
use tracesmart_label_verify::services::pipeline::{
    FieldComparator, PipelineError, TextExtractor, ValidationPipeline,
};
use tracesmart_label_verify::services::validation::RuleComparator;

/// Returns the same transcription for every image.
pub struct StaticExtractor(pub Option<String>);

impl StaticExtractor {
    pub fn text(text: &str) -> Self {
        Self(Some(text.to_string()))
    }
}

impl TextExtractor for StaticExtractor {
    async fn extract_text(&self, _image: &LabelImage) -> Result<Option<String>, GenAiError> {
        Ok(self.0.clone())
    }
}

/// Fails like an unreachable provider.
pub struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    async fn extract_text(&self, _image: &LabelImage) -> Result<Option<String>, GenAiError> {
        Err(GenAiError::Provider {
            status: 503,
            body: "service unavailable".to_string(),
        })
    }
}

/// Answers only after `delay`.
pub struct SlowExtractor {
    pub delay: Duration,
    pub text: String,
}

impl TextExtractor for SlowExtractor {
    async fn extract_text(&self, _image: &LabelImage) -> Result<Option<String>, GenAiError> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(self.text.clone()))
    }
}

/// Rule comparator that counts its invocations.
#[derive(Default)]
pub struct SpyComparator {
    pub calls: Arc<AtomicUsize>,
    inner: RuleComparator,
}

impl SpyComparator {
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl FieldComparator for SpyComparator {
    async fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compare(expected, extracted_text).await
    }
}

/// Stands in for a model that ignored the response schema.
pub struct RawOutputComparator(pub &'static str);

impl FieldComparator for RawOutputComparator {
    async fn compare(
        &self,
        _expected: &ExpectedFields,
        _extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        parse_verdict(self.0)
    }
}

/// Answers only after `delay`, with the rule verdict.
pub struct SlowComparator {
    pub delay: Duration,
}

impl FieldComparator for SlowComparator {
    async fn compare(
        &self,
        expected: &ExpectedFields,
        extracted_text: &str,
    ) -> Result<ValidationResponse, PipelineError> {
        tokio::time::sleep(self.delay).await;
        RuleComparator::default().compare(expected, extracted_text).await
    }
}

pub fn pipeline<E, C>(extractor: E, comparator: C) -> ValidationPipeline<E, C>
where
    E: TextExtractor,
    C: FieldComparator,
{
    ValidationPipeline::new(extractor, comparator, Duration::from_secs(5))
}

pub fn rules_info() -> PipelineInfo {
    PipelineInfo {
        comparison_mode: ComparisonMode::Rules,
        ocr_model: "stub".to_string(),
        validation_model: None,
        ai_timeout_secs: 5,
    }
}

/// Serve the API router on an ephemeral port and return its base URL.
pub async fn spawn_server<E, C>(state: AppState<E, C>) -> String
where
    E: TextExtractor + 'static,
    C: FieldComparator + 'static,
{
    let app = routes::api_router(state, 1024 * 1024);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://{addr}")
}

/// A `generateContent` call as received by [`spawn_fake_gemini`].
#[derive(Debug, Clone)]
pub struct ReceivedCall {
    pub path: String,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: serde_json::Value,
    calls: Arc<Mutex<Vec<ReceivedCall>>>,
}

async fn fake_generate_content(
    State(fake): State<FakeGemini>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, Json<serde_json::Value>) {
    fake.calls.lock().unwrap().push(ReceivedCall {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });
    (fake.status, Json(fake.reply))
}

/// Serve a stand-in Gemini endpoint answering every call with `status` and
/// `reply`. Returns its base URL and the calls it receives.
pub async fn spawn_fake_gemini(
    status: StatusCode,
    reply: serde_json::Value,
) -> (String, Arc<Mutex<Vec<ReceivedCall>>>) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(fake_generate_content).with_state(FakeGemini {
        status,
        reply,
        calls: Arc::clone(&calls),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake provider");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Fake provider error");
    });

    (format!("http://{addr}"), calls)
}

/// A successful `generateContent` reply carrying `text`.
pub fn candidate_reply(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}
