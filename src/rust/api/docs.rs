use axum::Json;
use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::models::{ErrorResponse, HealthResponse, SentimentRequest, SentimentResponse};

#[derive(OpenApi)]
#[openapi(
    info(title = "sentiment-server", description = "Multilingual sentiment classification"),
    paths(handlers::predict, handlers::health),
    components(schemas(SentimentRequest, SentimentResponse, HealthResponse, ErrorResponse))
)]
pub struct ApiDoc;

/// Serves the generated OpenAPI document.
pub async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
