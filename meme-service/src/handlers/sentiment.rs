use super::{observe, query_params};
use crate::dtos::{SentimentBody, SentimentParams};
use crate::error::ApiError;
use crate::services::validation;
use crate::startup::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};

/// `GET /getSentiment?message=...&tags=a,b,c`
pub async fn get_sentiment(
    State(state): State<AppState>,
    query: Result<Query<SentimentParams>, QueryRejection>,
) -> Result<Json<SentimentBody>, ApiError> {
    observe("get_sentiment", sentiment(&state, query).await)
}

async fn sentiment(
    state: &AppState,
    query: Result<Query<SentimentParams>, QueryRejection>,
) -> Result<Json<SentimentBody>, ApiError> {
    let params = query_params(query)?;
    let query = validation::sentiment_query(params.message.as_deref(), params.tags.as_deref())?;
    let outcome = state.orchestrator.analyze_sentiment(&query).await?;
    Ok(Json(outcome.into()))
}
