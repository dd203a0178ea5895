use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::model_manager::{ModelManager, CACHE_ENV_VAR};
use crate::runtime::RuntimeConfig;

/// Multilingual sentiment analysis server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Force a fresh download of the model files
    #[arg(short, long)]
    pub fresh: bool,

    /// Cache root for downloaded models
    #[arg(long, env = CACHE_ENV_VAR)]
    pub cache_dir: Option<PathBuf>,

    /// Serve a custom ONNX export instead of the built-in model
    #[arg(long, requires_all = ["tokenizer_path", "config_path"])]
    pub model_path: Option<PathBuf>,

    /// tokenizer.json of the custom model
    #[arg(long, requires = "model_path")]
    pub tokenizer_path: Option<PathBuf>,

    /// config.json (with id2label) of the custom model
    #[arg(long, requires = "model_path")]
    pub config_path: Option<PathBuf>,

    /// ONNX Runtime intra-op threads, 0 lets the runtime decide
    #[arg(long, default_value_t = 0)]
    pub intra_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            fresh: false,
            cache_dir: None,
            model_path: None,
            tokenizer_path: None,
            config_path: None,
            intra_threads: 0,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn models_dir(&self) -> PathBuf {
        match &self.cache_dir {
            Some(dir) => dir.join("models"),
            None => ModelManager::get_default_models_dir(),
        }
    }

    /// Model, tokenizer and config paths when a custom model was requested
    pub fn custom_model(&self) -> Option<(&Path, &Path, &Path)> {
        match (&self.model_path, &self.tokenizer_path, &self.config_path) {
            (Some(model), Some(tokenizer), Some(config)) => Some((model, tokenizer, config)),
            _ => None,
        }
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig::default().with_intra_threads(self.intra_threads)
    }
}
