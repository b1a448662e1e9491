pub mod health;
pub mod metrics;
pub mod validate;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::services::pipeline::{FieldComparator, TextExtractor};

/// Room for the expected fields and JSON framing around the image.
const JSON_ENVELOPE_BYTES: usize = 64 * 1024;

/// Body limit for the JSON route, where an image of `max_image_bytes` arrives
/// base64 encoded (4 output bytes per 3 input bytes).
pub fn json_body_limit(max_image_bytes: usize) -> usize {
    max_image_bytes.div_ceil(3) * 4 + JSON_ENVELOPE_BYTES
}

/// Validation API routes with the standard middleware stack.
///
/// Both routes admit a label image of `max_image_bytes`: raw on the multipart
/// route, base64 encoded on the JSON route.
pub fn api_router<E, C>(state: AppState<E, C>, max_image_bytes: usize) -> Router
where
    E: TextExtractor + 'static,
    C: FieldComparator + 'static,
{
    let json_limit = json_body_limit(max_image_bytes);
    let upload_limit = max_image_bytes + JSON_ENVELOPE_BYTES;

    Router::new()
        .route("/health", get(health::health_check::<E, C>))
        .route(
            "/api/v1/validate",
            post(validate::validate_label::<E, C>).layer(DefaultBodyLimit::max(json_limit)),
        )
        .route(
            "/api/v1/validate/upload",
            post(validate::validate_upload::<E, C>).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(json_limit.max(upload_limit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_limit_covers_base64_expansion() {
        let max: usize = 10 * 1024 * 1024;
        let encoded = max.div_ceil(3) * 4;
        assert!(json_body_limit(max) > encoded);
        assert!(json_body_limit(max) - encoded <= JSON_ENVELOPE_BYTES);
        assert_eq!(json_body_limit(3), 4 + JSON_ENVELOPE_BYTES);
    }
}
