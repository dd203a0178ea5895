use std::sync::Arc;
use ort::session::Session;
use tokenizers::Tokenizer;

use super::encoding::SequenceClassification;
use super::error::ClassifierError;
use super::labels::LabelConfig;
use super::model::{Prediction, SentimentModel};

/// A thread-safe sentiment classifier backed by an ONNX sequence
/// classification model.
///
/// # Thread Safety
///
/// This type is automatically `Send + Sync`: the tokenizer and session are
/// held in `Arc`s and never mutated after [`build`](super::SentimentClassifierBuilder::build).
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use sentiment_server::{SentimentClassifier, BuiltinModel};
///
/// let classifier = SentimentClassifier::builder()
///     .with_model(BuiltinModel::MultilingualSentiment)?
///     .build()?;
///
/// let prediction = classifier.predict("I love this!")?;
/// println!("{} ({:.2})", prediction.label, prediction.score);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SentimentClassifier {
    pub(crate) model_path: String,
    pub(crate) tokenizer_path: String,
    pub(crate) tokenizer: Arc<Tokenizer>,
    pub(crate) session: Arc<Session>,
    pub(crate) label_config: LabelConfig,
    pub(crate) max_sequence_length: usize,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<SentimentClassifier>();
    }
};

impl SequenceClassification for SentimentClassifier {
    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }

    fn session(&self) -> Option<&Session> {
        Some(&self.session)
    }
}

impl SentimentClassifier {
    /// Creates a new builder for fluent construction
    pub fn builder() -> super::builder::SentimentClassifierBuilder {
        super::builder::SentimentClassifierBuilder::new()
    }

    /// Returns information about the loaded model
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            model_path: self.model_path.clone(),
            tokenizer_path: self.tokenizer_path.clone(),
            labels: self.label_config.labels().to_vec(),
            score_function: self.label_config.score_function(),
            max_sequence_length: self.max_sequence_length,
        }
    }

    /// Returns the top label for `text` and its probability.
    ///
    /// # Errors
    /// - `ValidationError` if `text` is empty
    /// - `TokenizerError` / `ModelError` / `PredictionError` if inference fails
    pub fn predict(&self, text: &str) -> Result<Prediction, ClassifierError> {
        let logits = self.logits(text)?;
        self.label_config.top(logits.view())
    }

    /// Scores every label for `text`, in the model's output order.
    pub fn scores(&self, text: &str) -> Result<Vec<(String, f32)>, ClassifierError> {
        let logits = self.logits(text)?;
        let probs = self.label_config.probabilities(logits.view())?;
        Ok(self
            .label_config
            .labels()
            .iter()
            .cloned()
            .zip(probs.iter().cloned())
            .collect())
    }

    /// Number of tokens `text` occupies after truncation
    pub fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        SequenceClassification::count_tokens(self, text)
    }
}

impl SentimentModel for SentimentClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifierError> {
        self.predict(text)
    }

    fn labels(&self) -> &[String] {
        self.label_config.labels()
    }
}
