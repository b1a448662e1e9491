use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::app_state::{AppState, PipelineInfo};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub pipeline: PipelineInfo,
}

/// GET /health: liveness plus the pipeline's configured models and mode.
pub async fn health_check<E, C>(State(state): State<AppState<E, C>>) -> Json<HealthResponse>
where
    E: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pipeline: state.info.as_ref().clone(),
    })
}
