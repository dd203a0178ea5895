use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, ArrayView1};
use serde::Deserialize;

use super::error::ClassifierError;
use super::model::Prediction;
use super::utils::{argmax, sigmoid, softmax};

/// How raw logits become per-label scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreFunction {
    /// Mutually exclusive labels; scores sum to 1
    Softmax,
    /// Independent labels; each score is its own confidence
    Sigmoid,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
    #[serde(default)]
    problem_type: Option<String>,
    #[serde(default)]
    max_position_embeddings: Option<usize>,
}

/// The output contract of a sequence classification model, read from its
/// Hugging Face `config.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    labels: Vec<String>,
    score_function: ScoreFunction,
    max_position_embeddings: Option<usize>,
}

impl LabelConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClassifierError::BuildError(format!("Failed to read model config {:?}: {}", path, e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifierError> {
        let raw: RawConfig = serde_json::from_str(json)
            .map_err(|e| ClassifierError::BuildError(format!("Invalid model config: {}", e)))?;

        let mut indexed = Vec::with_capacity(raw.id2label.len());
        for (id, label) in raw.id2label {
            let id: usize = id.parse().map_err(|_| {
                ClassifierError::BuildError(format!("Non-numeric id2label key '{}'", id))
            })?;
            indexed.push((id, label));
        }
        indexed.sort_by_key(|(id, _)| *id);
        if indexed.iter().enumerate().any(|(pos, (id, _))| pos != *id) {
            return Err(ClassifierError::BuildError(
                "id2label ids must be contiguous and start at 0".into(),
            ));
        }

        let score_function = match raw.problem_type.as_deref() {
            Some("multi_label_classification") => ScoreFunction::Sigmoid,
            _ => ScoreFunction::Softmax,
        };

        Ok(Self {
            labels: indexed.into_iter().map(|(_, label)| label).collect(),
            score_function,
            max_position_embeddings: raw.max_position_embeddings,
        })
    }

    /// Labels ordered by output index. Empty when the config carries no
    /// `id2label`; see [`LabelConfig::ensure_labels`].
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn score_function(&self) -> ScoreFunction {
        self.score_function
    }

    pub fn max_position_embeddings(&self) -> Option<usize> {
        self.max_position_embeddings
    }

    /// Fills in `LABEL_i` names when the config has none, matching the
    /// model's output width.
    pub fn ensure_labels(&mut self, num_outputs: usize) -> Result<(), ClassifierError> {
        if self.labels.is_empty() {
            self.labels = (0..num_outputs).map(|i| format!("LABEL_{}", i)).collect();
        }
        if self.labels.len() != num_outputs {
            return Err(ClassifierError::BuildError(format!(
                "Model produces {} logits but config declares {} labels",
                num_outputs,
                self.labels.len()
            )));
        }
        Ok(())
    }

    /// Turns one row of logits into per-label probabilities in [0, 1].
    ///
    /// # Errors
    /// `PredictionError` if the row width differs from the label count or
    /// any logit is NaN or infinite.
    pub fn probabilities(&self, logits: ArrayView1<f32>) -> Result<Array1<f32>, ClassifierError> {
        if logits.len() != self.labels.len() {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned {} logits for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }
        if let Some(pos) = logits.iter().position(|x| !x.is_finite()) {
            return Err(ClassifierError::PredictionError(format!(
                "Model returned non-finite logit {} for label '{}'",
                logits[pos], self.labels[pos]
            )));
        }

        let probs = match self.score_function {
            ScoreFunction::Softmax => softmax(logits)
                .ok_or_else(|| ClassifierError::PredictionError("Logits cannot be normalized".into()))?,
            ScoreFunction::Sigmoid => sigmoid(logits),
        };
        Ok(probs.mapv(|p| p.clamp(0.0, 1.0)))
    }

    /// The highest scoring label for one row of logits. Ties go to the
    /// lower output index.
    pub fn top(&self, logits: ArrayView1<f32>) -> Result<Prediction, ClassifierError> {
        let probs = self.probabilities(logits)?;
        let (index, score) = argmax(&probs)
            .ok_or_else(|| ClassifierError::PredictionError("Model returned no scores".into()))?;
        Ok(Prediction {
            label: self.labels[index].clone(),
            score,
        })
    }
}
