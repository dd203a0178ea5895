use tokenizers::Tokenizer;
use ort::session::Session;
use ort::value::Tensor;
use ndarray::{Array1, Array2};
use std::collections::HashMap;

use super::error::ClassifierError;

/// Runs a sequence classification ONNX model over tokenized text.
///
/// The ONNX model is expected to:
/// - Accept `input_ids` and `attention_mask` (shape [batch_size, sequence_length]),
///   and optionally `token_type_ids`
/// - Output logits of shape [batch_size, num_labels] as its first output
pub(crate) trait SequenceClassification {
    /// Returns the initialized tokenizer if available
    fn tokenizer(&self) -> Option<&Tokenizer>;

    /// Returns the initialized ONNX session if available
    fn session(&self) -> Option<&Session>;

    /// Counts the tokens the model would see for `text`, special tokens included.
    fn count_tokens(&self, text: &str) -> Result<usize, ClassifierError> {
        self.tokenize(text).map(|tokens| tokens.len())
    }

    /// Converts text into token IDs with the model's special tokens added.
    ///
    /// Truncation to the model's maximum sequence length is configured on the
    /// tokenizer itself when it is loaded.
    ///
    /// # Errors
    /// - `ValidationError` if the text is empty
    /// - `TokenizerError` if the tokenizer is not initialized or encoding fails
    fn tokenize(&self, text: &str) -> Result<Vec<u32>, ClassifierError> {
        if text.is_empty() {
            return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
        }
        let tokenizer = self.tokenizer()
            .ok_or_else(|| ClassifierError::TokenizerError("Tokenizer not initialized".into()))?;

        let encoding = tokenizer.encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))?;
        let token_ids = encoding.get_ids();
        if token_ids.is_empty() {
            return Err(ClassifierError::TokenizerError("Tokenizer produced no tokens".into()));
        }
        Ok(token_ids.to_vec())
    }

    /// Tokenizes and classifies `text`, returning one raw logit per label.
    fn logits(&self, text: &str) -> Result<Array1<f32>, ClassifierError> {
        let tokens = self.tokenize(text)?;
        self.run_model(&tokens)
    }

    /// Runs the ONNX model on a single sequence of token IDs.
    ///
    /// # Errors
    /// - `ModelError` if the session is missing, tensor creation or the run fails
    /// - `PredictionError` if the output is not a single row of logits
    fn run_model(&self, tokens: &[u32]) -> Result<Array1<f32>, ClassifierError> {
        let session = self.session()
            .ok_or_else(|| ClassifierError::ModelError("Session not initialized".into()))?;
        let len = tokens.len();

        let input_ids = Array2::from_shape_vec((1, len), tokens.iter().map(|&x| x as i64).collect())
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input array: {}", e)))?;
        // No padding is applied, so every position is a real token
        let attention_mask = Array2::<i64>::ones((1, len));

        let mut input_tensors = HashMap::new();
        input_tensors.insert("input_ids", Tensor::from_array(input_ids)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create input tensor: {}", e)))?);
        input_tensors.insert("attention_mask", Tensor::from_array(attention_mask)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to create mask tensor: {}", e)))?);
        if session.inputs.iter().any(|input| input.name == "token_type_ids") {
            input_tensors.insert("token_type_ids", Tensor::from_array(Array2::<i64>::zeros((1, len)))
                .map_err(|e| ClassifierError::ModelError(format!("Failed to create type ids tensor: {}", e)))?);
        }

        let outputs = session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let output_tensor = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = output_tensor.shape();
        if shape.len() != 2 || shape[0] != 1 || shape[1] == 0 {
            return Err(ClassifierError::PredictionError(
                format!("Unexpected logits shape {:?}, expected [1, num_labels]", shape)
            ));
        }
        Ok(Array1::from_iter(output_tensor.iter().cloned()))
    }
}
