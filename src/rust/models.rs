/// Models that ship with a known download location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinModel {
    /// `tabularisai/multilingual-sentiment-analysis`, a DistilBERT classifier
    /// over five sentiment categories, exported to ONNX.
    MultilingualSentiment,
}

impl Default for BuiltinModel {
    fn default() -> Self {
        BuiltinModel::MultilingualSentiment
    }
}

/// Static properties of a model that are not discoverable from the ONNX graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCharacteristics {
    /// Maximum number of tokens the model accepts, special tokens included
    pub max_sequence_length: usize,
    /// Number of output categories; checked against the loaded model
    pub num_labels: usize,
}

/// Where to fetch a model's files from and how to verify them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub name: String,
    pub model_url: String,
    pub tokenizer_url: String,
    pub config_url: String,
    /// SHA-256 of `model.onnx`; unverified when `None`
    pub model_hash: Option<String>,
    /// SHA-256 of `tokenizer.json`; unverified when `None`
    pub tokenizer_hash: Option<String>,
}

const HF_REPO: &str = "https://huggingface.co/tabularisai/multilingual-sentiment-analysis/resolve/main";

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            BuiltinModel::MultilingualSentiment => ModelInfo {
                name: "multilingual-sentiment".to_string(),
                model_url: format!("{}/onnx/model.onnx", HF_REPO),
                tokenizer_url: format!("{}/tokenizer.json", HF_REPO),
                config_url: format!("{}/config.json", HF_REPO),
                model_hash: None,
                tokenizer_hash: None,
            },
        }
    }

    pub fn characteristics(&self) -> ModelCharacteristics {
        match self {
            BuiltinModel::MultilingualSentiment => ModelCharacteristics {
                max_sequence_length: 512,
                num_labels: 5,
            },
        }
    }
}
