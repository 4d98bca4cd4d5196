use super::{observe, query_params, read_body, Body};
use crate::dtos::{GenerateMemeParams, ImageFileResponse, ImageResponse};
use crate::error::{ApiError, ValidationError};
use crate::models::OutputFormat;
use crate::services::codec::encode_base64;
use crate::services::validation;
use crate::startup::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

/// `GET /generateMeme?description=...&format=json|png`
pub async fn generate_meme(
    State(state): State<AppState>,
    query: Result<Query<GenerateMemeParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    observe("generate_meme", generate(&state, query).await)
}

async fn generate(
    state: &AppState,
    query: Result<Query<GenerateMemeParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query_params(query)?;
    let request = validation::generation_request(params.description.as_deref())?;
    let format = validation::output_format(params.format.as_deref())?;

    let artifact = state.orchestrator.generate_meme(&request).await?;

    Ok(match format {
        OutputFormat::Json => Json(ImageResponse {
            image: encode_base64(&artifact.bytes),
        })
        .into_response(),
        OutputFormat::Png => {
            ([(header::CONTENT_TYPE, artifact.mime_type)], artifact.bytes).into_response()
        }
    })
}

/// `POST /redoGeneration` with a multipart `image` upload or a JSON `{"description"}` body.
pub async fn redo_generation(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<ImageFileResponse>, ApiError> {
    observe("redo_generation", redo(&state, request).await)
}

async fn redo(state: &AppState, request: Request) -> Result<Json<ImageFileResponse>, ApiError> {
    let artifact = match read_body(request, state).await? {
        Body::Upload(upload) => state.orchestrator.regenerate_from_image(upload).await?,
        Body::Json(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => {
            return Err(ValidationError::MissingField("image".to_string()).into());
        }
        Body::Json(bytes) => {
            let request = validation::description_body(&bytes)?;
            state
                .orchestrator
                .regenerate_from_description(&request)
                .await?
        }
    };

    Ok(Json(ImageFileResponse {
        image_file: encode_base64(&artifact.bytes),
    }))
}
