use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "meme-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness probe: both gateways must be configured.
pub async fn readiness_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    match state.orchestrator.check_gateways().await {
        Ok(()) => Ok((StatusCode::OK, Json(json!({ "status": "ready" })))),
        Err(e) => {
            tracing::warn!(error = %e, "Gateway not ready");
            Err(AppError::ServiceUnavailable)
        }
    }
}
