//! A multilingual sentiment analysis server backed by an ONNX sequence
//! classification model.
//!
//! The library exposes the pieces the `sentiment-server` binary is built
//! from: a model cache, a thread-safe classifier, and an axum router.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use sentiment_server::{BuiltinModel, ModelManager, SentimentClassifier};
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_model_downloaded(&BuiltinModel::MultilingualSentiment.get_model_info()).await?;
//!
//! let classifier = SentimentClassifier::builder()
//!     .with_model(BuiltinModel::MultilingualSentiment)?
//!     .build()?;
//!
//! let prediction = classifier.predict("Ce film était génial !")?;
//! println!("{}: {:.2}", prediction.label, prediction.score);
//! # Ok(())
//! # }
//! ```
//!
//! # Serving
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! use std::sync::Arc;
//! use sentiment_server::{api, AppState, ServerConfig};
//!
//! let config = ServerConfig::default();
//! let state = AppState::from_config(&config).await?;
//! api::serve(&config, Arc::new(state)).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod app_state;
pub mod classifier;
pub mod config;
mod runtime;
pub mod model_manager;
pub mod models;

pub use app_state::AppState;
pub use classifier::{
    ClassifierError, ClassifierInfo, LabelConfig, Prediction, ScoreFunction, SentimentClassifier,
    SentimentClassifierBuilder, SentimentModel,
};
pub use config::ServerConfig;
pub use runtime::{RuntimeConfig, create_session_builder};
pub use model_manager::{ModelManager, ModelError};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};

/// Initializes `env_logger`, defaulting to `info` when `RUST_LOG` is unset.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
