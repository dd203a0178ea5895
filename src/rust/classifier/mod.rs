mod error;
mod encoding;
mod labels;
mod model;
pub mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod utils;

pub use error::ClassifierError;
pub use labels::{LabelConfig, ScoreFunction};
pub use model::{Prediction, SentimentModel};
pub use classifier::SentimentClassifier;
pub use builder::SentimentClassifierBuilder;

/// Information about the loaded model and its output contract
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the ONNX model file
    pub model_path: String,
    /// Path to the tokenizer file
    pub tokenizer_path: String,
    /// Labels in output order
    pub labels: Vec<String>,
    /// Whether label scores are a softmax distribution or independent sigmoids
    pub score_function: ScoreFunction,
    /// Longer inputs are truncated to this many tokens
    pub max_sequence_length: usize,
}
