use super::{observe, query_params, read_body, Body};
use crate::dtos::ImageInfoParams;
use crate::error::ApiError;
use crate::services::{metrics, validation};
use crate::startup::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, Request, State},
    response::{IntoResponse, Response},
    Json,
};

/// `POST /imageInfo?numTags=..&contentLength=..`
///
/// A JSON array `[{"Id", "imageFile"}]` answers with one result per item; a multipart
/// `image` upload answers with a single result object.
pub async fn image_info(
    State(state): State<AppState>,
    query: Result<Query<ImageInfoParams>, QueryRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    observe("image_info", analyze(&state, query, request).await)
}

async fn analyze(
    state: &AppState,
    query: Result<Query<ImageInfoParams>, QueryRejection>,
    request: Request,
) -> Result<Response, ApiError> {
    let params = query_params(query)?;
    let body = read_body(request, state).await?;
    let analysis = validation::analysis_params(
        params.num_tags.as_deref(),
        params.content_length.as_deref(),
        state.orchestrator.limits(),
    )?;

    match body {
        Body::Json(bytes) => {
            let batch = validation::image_batch(&bytes)?;
            metrics::record_batch_size("json", batch.len());
            let results = state.orchestrator.analyze_batch(batch, analysis).await?;
            Ok(Json(results).into_response())
        }
        Body::Upload(upload) => {
            metrics::record_batch_size("multipart", 1);
            let result = state.orchestrator.analyze_single(upload, analysis).await?;
            Ok(Json(result).into_response())
        }
    }
}
