use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::models::label::{ExpectedFields, ValidationResponse};
use crate::models::verification::ValidationRequest;
use crate::services::image::LabelImage;
use crate::services::pipeline::{FieldComparator, TextExtractor};

/// POST /api/v1/validate: validate a label supplied as a data URI.
///
/// Always answers 200 with a verdict once the body parses; pipeline failures
/// are reported through `isValid = false`.
pub async fn validate_label<E, C>(
    State(state): State<AppState<E, C>>,
    Json(request): Json<ValidationRequest>,
) -> Json<ValidationResponse>
where
    E: TextExtractor + 'static,
    C: FieldComparator + 'static,
{
    Json(state.pipeline.validate(&request).await)
}

/// POST /api/v1/validate/upload: validate an uploaded label image file.
///
/// Multipart fields: `image` (file), `device_id`, `batch_id`,
/// `manufacturing_date`, `rohs_compliance`, and optional `serial_number`.
/// Bodies over the route's limit are rejected with 413.
pub async fn validate_upload<E, C>(
    State(state): State<AppState<E, C>>,
    mut multipart: Multipart,
) -> Result<Json<ValidationResponse>, StatusCode>
where
    E: TextExtractor + 'static,
    C: FieldComparator + 'static,
{
    let mut image: Option<LabelImage> = None;
    let mut device_id = None;
    let mut batch_id = None;
    let mut manufacturing_date = None;
    let mut rohs_compliance = None;
    let mut serial_number = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| e.status())? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let data = field.bytes().await.map_err(|e| e.status())?;
                let parsed = LabelImage::from_bytes(data.to_vec())
                    .map_err(|_| StatusCode::UNSUPPORTED_MEDIA_TYPE)?;
                image = Some(parsed);
            }
            "device_id" => device_id = Some(field_text(field).await?),
            "batch_id" => batch_id = Some(field_text(field).await?),
            "manufacturing_date" => manufacturing_date = Some(field_text(field).await?),
            "rohs_compliance" => {
                let value = field_text(field).await?;
                rohs_compliance = Some(parse_flag(&value).ok_or(StatusCode::BAD_REQUEST)?);
            }
            "serial_number" => {
                serial_number = Some(field_text(field).await?).filter(|v| !v.is_empty());
            }
            _ => {}
        }
    }

    let image = image.ok_or(StatusCode::BAD_REQUEST)?;
    let expected = ExpectedFields {
        device_id: device_id.ok_or(StatusCode::BAD_REQUEST)?,
        batch_id: batch_id.ok_or(StatusCode::BAD_REQUEST)?,
        manufacturing_date: manufacturing_date.ok_or(StatusCode::BAD_REQUEST)?,
        rohs_compliance: rohs_compliance.ok_or(StatusCode::BAD_REQUEST)?,
        serial_number,
    };

    let request = ValidationRequest::new(image.to_data_uri(), expected);
    Ok(Json(state.pipeline.validate(&request).await))
}

async fn field_text(field: Field<'_>) -> Result<String, StatusCode> {
    let value = field.text().await.map_err(|e| e.status())?;
    Ok(value.trim().to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}
