use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::classifier::SentimentClassifier;
use super::labels::LabelConfig;
use crate::{BuiltinModel, runtime::{RuntimeConfig, create_session_builder}, ModelManager};

/// Used when neither the caller nor the model config names a limit
const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 512;

/// A builder for constructing a [`SentimentClassifier`] with a fluent interface.
#[derive(Default, Debug)]
pub struct SentimentClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    tokenizer: Option<Tokenizer>,
    session: Option<Session>,
    label_config: Option<LabelConfig>,
    max_sequence_length: Option<usize>,
    expected_labels: Option<usize>,
    models_dir: Option<PathBuf>,
    runtime_config: RuntimeConfig,
}

impl SentimentClassifierBuilder {
    /// Creates a new empty builder with default runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution.
    ///
    /// Must be called before `with_model` / `with_custom_model` to take effect.
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Looks up built-in models in `dir` instead of the default cache.
    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(dir.into());
        self
    }

    /// Loads a built-in model from the local cache.
    ///
    /// # Returns
    /// An error if:
    ///   - A model is already set
    ///   - The model is not downloaded
    ///   - The model, tokenizer or config failed to load
    ///   - The model structure is invalid
    pub fn with_model(self, model: BuiltinModel) -> Result<Self, ClassifierError> {
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }

        let manager = match &self.models_dir {
            Some(dir) => ModelManager::new(dir),
            None => ModelManager::new_default(),
        }
        .map_err(|e| ClassifierError::BuildError(format!("Failed to create model manager: {}", e)))?;

        let info = model.get_model_info();
        if !manager.is_model_downloaded(&info.name) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{:?}' is not downloaded. Please download it first using ModelManager::download_model()",
                model
            )));
        }

        let characteristics = model.characteristics();
        let mut builder = self.load(
            &manager.get_model_path(&info.name),
            &manager.get_tokenizer_path(&info.name),
            &manager.get_config_path(&info.name),
            Some(characteristics.max_sequence_length),
        )?;
        builder.expected_labels = Some(characteristics.num_labels);
        Ok(builder)
    }

    /// Loads a custom ONNX export of a sequence classification model.
    ///
    /// # Arguments
    /// * `model_path` - Path to the ONNX model file
    /// * `tokenizer_path` - Path to the `tokenizer.json` file
    /// * `config_path` - Path to the Hugging Face `config.json` carrying `id2label`
    ///
    /// The maximum sequence length is taken from `max_position_embeddings` in
    /// the config, falling back to 512 tokens.
    pub fn with_custom_model(
        self,
        model_path: &str,
        tokenizer_path: &str,
        config_path: &str,
    ) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() || config_path.is_empty() {
            return Err(ClassifierError::BuildError("Model, tokenizer and config paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }
        for (kind, path) in [("Model", model_path), ("Tokenizer", tokenizer_path), ("Config", config_path)] {
            if !Path::new(path).exists() {
                return Err(ClassifierError::BuildError(format!("{} file not found: {}", kind, path)));
            }
        }

        self.load(Path::new(model_path), Path::new(tokenizer_path), Path::new(config_path), None)
    }

    fn load(
        mut self,
        model_path: &Path,
        tokenizer_path: &Path,
        config_path: &Path,
        max_sequence_length: Option<usize>,
    ) -> Result<Self, ClassifierError> {
        let label_config = LabelConfig::from_file(config_path)?;
        let max_sequence_length = max_sequence_length
            .or(label_config.max_position_embeddings())
            .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);

        let tokenizer = Self::load_tokenizer(tokenizer_path, max_sequence_length)?;
        info!("Tokenizer loaded successfully");

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(model_path)?;

        Self::validate_model(&session)?;
        info!("Model structure validated successfully");

        self.model_path = Some(model_path.to_string_lossy().to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string_lossy().to_string());
        self.tokenizer = Some(tokenizer);
        self.session = Some(session);
        self.label_config = Some(label_config);
        self.max_sequence_length = Some(max_sequence_length);
        Ok(self)
    }

    fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, ClassifierError> {
        let mut tokenizer = Tokenizer::from_file(path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| ClassifierError::BuildError(format!("Failed to configure truncation: {}", e)))?;
        tokenizer.with_padding(None);
        Ok(tokenizer)
    }

    /// Builds the classifier, resolving the label table against the model's
    /// actual output width with a warm-up inference.
    pub fn build(mut self) -> Result<SentimentClassifier, ClassifierError> {
        let (model_path, tokenizer_path) = match (self.model_path.take(), self.tokenizer_path.take()) {
            (Some(model), Some(tokenizer)) => (model, tokenizer),
            _ => return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string())),
        };
        let tokenizer = self.tokenizer.take()
            .ok_or_else(|| ClassifierError::BuildError("No tokenizer loaded".into()))?;
        let session = self.session.take()
            .ok_or_else(|| ClassifierError::BuildError("No ONNX model loaded".into()))?;
        let mut label_config = self.label_config.take()
            .ok_or_else(|| ClassifierError::BuildError("Model config not loaded".into()))?;
        let max_sequence_length = self.max_sequence_length
            .unwrap_or(DEFAULT_MAX_SEQUENCE_LENGTH);

        let mut classifier = SentimentClassifier {
            model_path,
            tokenizer_path,
            tokenizer: Arc::new(tokenizer),
            session: Arc::new(session),
            label_config: label_config.clone(),
            max_sequence_length,
        };

        let warmup = super::encoding::SequenceClassification::logits(&classifier, "warm-up")
            .map_err(|e| ClassifierError::BuildError(format!("Warm-up inference failed: {}", e)))?;
        label_config.ensure_labels(warmup.len())?;
        Self::check_label_count(self.expected_labels, label_config.labels().len())?;
        info!("Model outputs {} labels: {:?}", warmup.len(), label_config.labels());
        classifier.label_config = label_config;

        Ok(classifier)
    }

    fn check_label_count(expected: Option<usize>, actual: usize) -> Result<(), ClassifierError> {
        match expected {
            Some(expected) if expected != actual => Err(ClassifierError::BuildError(format!(
                "Expected a model with {} labels, loaded one with {}",
                expected, actual
            ))),
            _ => Ok(()),
        }
    }

    /// Validates that the model has the expected input/output structure
    fn validate_model(session: &Session) -> Result<(), ClassifierError> {
        for required in ["input_ids", "attention_mask"] {
            if !session.inputs.iter().any(|input| input.name == required) {
                return Err(ClassifierError::ModelError(format!(
                    "Model is missing required input '{}'",
                    required
                )));
            }
        }

        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(())
    }
}
