//! HTTP handlers. Each one validates its input, hands the typed value to the
//! orchestrator and shapes the response.

pub mod health;
pub mod image_info;
pub mod memes;
pub mod metrics;
pub mod sentiment;

pub use health::{health_check, readiness_check};
pub use image_info::image_info;
pub use memes::{generate_meme, redo_generation};
pub use metrics::metrics;
pub use sentiment::get_sentiment;

use crate::error::{ApiError, ValidationError};
use crate::services::metrics::record_request;
use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, FromRequest, Multipart, Query, Request},
    http::{header, StatusCode},
};

/// Multipart field carrying an uploaded image.
const IMAGE_FIELD: &str = "image";

/// Request body after content-type dispatch.
pub(crate) enum Body {
    Upload(Vec<u8>),
    Json(Bytes),
}

/// Read the body as an image upload (multipart) or raw JSON bytes.
pub(crate) async fn read_body<S>(request: Request, state: &S) -> Result<Body, ApiError>
where
    S: Send + Sync,
{
    if is_multipart(&request) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| upload_error(e.status(), e.body_text()))?;
        return Ok(Body::Upload(read_image_field(multipart).await?));
    }

    let bytes = Bytes::from_request(request, state)
        .await
        .map_err(|e| upload_error(e.status(), e.body_text()))?;
    Ok(Body::Json(bytes))
}

/// Unwrap query parameters; an undecodable query string answers with the shared error body.
pub(crate) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query.map(|Query(params)| params).map_err(|e| {
        tracing::debug!(error = %e.body_text(), "Rejected query string");
        ValidationError::MalformedQuery.into()
    })
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// First non-empty `image` field; other fields are skipped.
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e.status(), e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(e.status(), e.body_text()))?;

        if data.is_empty() {
            break;
        }
        return Ok(data.to_vec());
    }

    Err(ValidationError::MissingField(IMAGE_FIELD.to_string()).into())
}

fn upload_error(status: StatusCode, detail: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::PayloadTooLarge.into()
    } else {
        ValidationError::MalformedUpload(detail).into()
    }
}

/// Count the request under `endpoint` and pass the result through.
pub(crate) fn observe<T>(endpoint: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    let outcome = match &result {
        Ok(_) => "success",
        Err(e) if e.status().is_client_error() => "rejected",
        Err(_) => "error",
    };
    record_request(endpoint, outcome);
    result
}
