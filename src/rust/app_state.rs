use std::sync::Arc;

use anyhow::Context;
use log::info;

use crate::classifier::{SentimentClassifier, SentimentModel};
use crate::config::ServerConfig;
use crate::model_manager::ModelManager;
use crate::models::BuiltinModel;

/// Shared state handed to every request handler.
///
/// Built once before the listener binds; the model inside is read-only.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn SentimentModel>,
    pub model_name: String,
}

impl AppState {
    pub fn new(model: Arc<dyn SentimentModel>, model_name: impl Into<String>) -> Self {
        Self {
            model,
            model_name: model_name.into(),
        }
    }

    /// Downloads (if needed) and loads the model named by `config`.
    ///
    /// Any failure here is a startup failure; the caller must not serve
    /// traffic without a model.
    pub async fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let builder = SentimentClassifier::builder().with_runtime_config(config.runtime_config());

        let (builder, model_name) = match config.custom_model() {
            Some((model, tokenizer, model_config)) => {
                info!("Loading custom model from {:?}", model);
                let builder = builder
                    .with_custom_model(
                        &model.to_string_lossy(),
                        &tokenizer.to_string_lossy(),
                        &model_config.to_string_lossy(),
                    )
                    .context("failed to load custom model")?;
                (builder, model.to_string_lossy().to_string())
            }
            None => {
                let model = BuiltinModel::default();
                let model_info = model.get_model_info();
                let manager = ModelManager::new(config.models_dir())
                    .context("failed to create model cache directory")?;

                if config.fresh {
                    info!("Fresh download requested - removing any existing model files...");
                    manager.remove_download(&model_info.name)?;
                }
                manager
                    .ensure_model_downloaded(&model_info)
                    .await
                    .with_context(|| format!("failed to download model '{}'", model_info.name))?;

                let builder = builder
                    .with_models_dir(manager.models_dir())
                    .with_model(model)
                    .context("failed to load built-in model")?;
                (builder, model_info.name)
            }
        };

        let classifier = builder.build().context("failed to build classifier")?;
        let classifier_info = classifier.info();
        info!("Model loaded from {}", classifier_info.model_path);
        info!("  Labels: {:?}", classifier_info.labels);
        info!("  Scores: {:?}, max sequence length {}", classifier_info.score_function, classifier_info.max_sequence_length);

        Ok(Self::new(Arc::new(classifier), model_name))
    }
}
