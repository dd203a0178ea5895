use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::models::{ErrorResponse, HealthResponse, SentimentRequest, SentimentResponse};
use crate::app_state::AppState;

/// Reachability implies health: the server only starts once the model loaded.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/predict",
    request_body = SentimentRequest,
    responses(
        (status = 200, description = "Top sentiment label and its probability", body = SentimentResponse),
        (status = 422, description = "Missing, empty or undecodable text", body = ErrorResponse),
        (status = 500, description = "Inference failed", body = ErrorResponse)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SentimentRequest>, JsonRejection>,
) -> Result<Json<SentimentResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::Validation(rejection.body_text()))?;
    request.validate()?;

    // Inference is CPU-bound; keep it off the async workers
    let model = Arc::clone(&state.model);
    let prediction = tokio::task::spawn_blocking(move || model.classify(&request.text))
        .await
        .map_err(|e| ApiError::Inference(format!("inference task failed: {}", e)))??;

    log::debug!("Predicted {} ({:.3})", prediction.label, prediction.score);
    Ok(Json(SentimentResponse::from(prediction)))
}

pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            detail: "Not Found".to_string(),
        }),
    )
}
