use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::api::models::ErrorResponse;
use crate::classifier::ClassifierError;

/// Message returned to callers when inference fails
pub const INFERENCE_FAILED: &str = "Failed to analyze sentiment";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request body was missing, malformed, or failed schema checks
    #[error("invalid request: {0}")]
    Validation(String),
    /// The model failed; the detail is logged but never sent to the client
    #[error("inference failed: {0}")]
    Inference(String),
}

impl From<ClassifierError> for ApiError {
    // Inputs reaching the model have already passed validation, so anything
    // it rejects is a server-side failure.
    fn from(err: ClassifierError) -> Self {
        ApiError::Inference(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            ApiError::Validation(detail) => detail,
            ApiError::Inference(detail) => {
                log::error!("Prediction error: {}", detail);
                INFERENCE_FAILED.to_string()
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}
