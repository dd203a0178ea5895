use serde::Serialize;

use super::error::ClassifierError;

/// The top category for a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// One of the model's labels, e.g. "Very Positive"
    pub label: String,
    /// Probability of `label`, in [0, 1]
    pub score: f32,
}

/// A loaded sentiment model that can be shared across request handlers.
///
/// Implementations must be safe to call concurrently without locking; the
/// HTTP layer calls [`SentimentModel::classify`] from blocking worker threads.
pub trait SentimentModel: Send + Sync {
    /// Classifies one text. Blocking; may take tens of milliseconds.
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError>;

    /// Every label `classify` can return, in output order.
    fn labels(&self) -> &[String];
}
