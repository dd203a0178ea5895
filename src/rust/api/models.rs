use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::error::ApiError;
use crate::classifier::Prediction;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SentimentRequest {
    /// Text to classify, in any language the model covers
    #[schema(min_length = 1, example = "I love this!")]
    pub text: String,
}

impl SentimentRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.text.is_empty() {
            return Err(ApiError::Validation(
                "text: ensure this value has at least 1 character".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentResponse {
    /// One of the model's labels
    #[schema(example = "Very Positive")]
    pub sentiment: String,
    /// Probability of `sentiment`
    #[schema(minimum = 0.0, maximum = 1.0)]
    pub score: f32,
}

impl From<Prediction> for SentimentResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            sentiment: prediction.label,
            score: prediction.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_only_empty_text() {
        assert!(SentimentRequest { text: String::new() }.validate().is_err());
        assert!(SentimentRequest { text: " ".to_string() }.validate().is_ok());
        assert!(SentimentRequest { text: "Ça me plaît".to_string() }.validate().is_ok());
    }

    #[test]
    fn test_response_shape() {
        let response = SentimentResponse::from(Prediction {
            label: "Positive".to_string(),
            score: 0.75,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, serde_json::json!({"sentiment": "Positive", "score": 0.75}));
    }
}
