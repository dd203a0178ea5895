use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

/// Environment variable overriding the cache root
pub const CACHE_ENV_VAR: &str = "SENTIMENT_CACHE";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Download of {url} failed with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// One downloadable file of a model
struct ModelFile<'a> {
    kind: &'static str,
    url: &'a str,
    path: PathBuf,
    hash: Option<&'a str>,
}

/// Downloads model files into a local cache and verifies them.
#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        if let Ok(path) = env::var(CACHE_ENV_VAR) {
            return PathBuf::from(path).join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("sentiment-server").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("sentiment-server").join("models");
        }

        env::temp_dir().join("sentiment-server").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn get_model_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("model.onnx")
    }

    pub fn get_tokenizer_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("tokenizer.json")
    }

    pub fn get_config_path(&self, name: &str) -> PathBuf {
        self.models_dir.join(name).join("config.json")
    }

    pub fn is_model_downloaded(&self, name: &str) -> bool {
        let files = [
            self.get_model_path(name),
            self.get_tokenizer_path(name),
            self.get_config_path(name),
        ];
        for path in &files {
            log::debug!("  {:?} (exists: {})", path, path.exists());
        }
        files.iter().all(|path| path.exists())
    }

    fn files<'a>(&self, info: &'a ModelInfo) -> [ModelFile<'a>; 3] {
        [
            ModelFile {
                kind: "model",
                url: &info.model_url,
                path: self.get_model_path(&info.name),
                hash: info.model_hash.as_deref(),
            },
            ModelFile {
                kind: "tokenizer",
                url: &info.tokenizer_url,
                path: self.get_tokenizer_path(&info.name),
                hash: info.tokenizer_hash.as_deref(),
            },
            ModelFile {
                kind: "config",
                url: &info.config_url,
                path: self.get_config_path(&info.name),
                hash: None,
            },
        ]
    }

    /// Fetches every file of `info` that is missing or fails verification.
    ///
    /// On any failure the partially downloaded model is removed so the next
    /// attempt starts clean.
    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(&info.name);
        log::info!("Creating model directory at {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        for file in self.files(info) {
            if let Err(e) = self.fetch_if_needed(&file).await {
                log::error!("Failed to set up {} file: {}", file.kind, e);
                let _ = self.remove_download(&info.name);
                return Err(e);
            }
        }

        log::info!("Model '{}' ready to use", info.name);
        Ok(())
    }

    async fn fetch_if_needed(&self, file: &ModelFile<'_>) -> Result<(), ModelError> {
        if file.path.exists() {
            if self.is_intact(file)? {
                log::info!("Existing {} file at {:?} is usable", file.kind, file.path);
                return Ok(());
            }
            log::warn!("{} file at {:?} failed verification, redownloading", file.kind, file.path);
        }
        self.download_and_verify_file(file.url, &file.path, file.hash, file.kind).await
    }

    fn hash_bytes(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }

    /// `model.onnx` -> `model.onnx.<suffix>`
    fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(suffix);
        path.with_file_name(name)
    }

    /// Where the SHA-256 recorded at download time is kept
    fn record_path(path: &Path) -> PathBuf {
        Self::with_suffix(path, "sha256")
    }

    fn part_path(path: &Path) -> PathBuf {
        Self::with_suffix(path, "part")
    }

    /// Writes through a `.part` file and renames it into place, so `path`
    /// either holds the complete content or does not exist.
    fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let part = Self::part_path(path);
        fs::write(&part, bytes)?;
        fs::rename(&part, path).map_err(|e| {
            let _ = fs::remove_file(&part);
            e
        })
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ModelError> {
        let bytes = fs::read(path)?;
        let hash = Self::hash_bytes(&bytes);
        log::debug!("{:?}: {} bytes, sha256 {} (expected {})", path, bytes.len(), hash, expected_hash);
        Ok(hash == expected_hash)
    }

    /// A file is intact when it matches its pinned hash or, without one, the
    /// hash recorded when it was downloaded. Files with neither are not
    /// trusted.
    fn is_intact(&self, file: &ModelFile<'_>) -> Result<bool, ModelError> {
        if !file.path.exists() {
            return Ok(false);
        }
        let expected = match file.hash {
            Some(pinned) => pinned.to_string(),
            None => match fs::read_to_string(Self::record_path(&file.path)) {
                Ok(recorded) => recorded.trim().to_string(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::info!("No recorded hash for {:?}", file.path);
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            },
        };
        self.verify_file(&file.path, &expected)
    }

    /// Returns whether all files are present and match their pinned or
    /// recorded hashes.
    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model '{}' is not fully downloaded", info.name);
            return Ok(false);
        }

        for file in self.files(info) {
            let ok = self.is_intact(&file)?;
            log::info!("  {} hash verification: {}", file.kind, ok);
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {} to {:?}", file_type, url, path);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        let hash = Self::hash_bytes(&bytes);
        if let Some(expected) = expected_hash {
            if hash != expected {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::write_atomically(path, &bytes)?;
        Self::write_atomically(&Self::record_path(path), hash.as_bytes())?;

        if !self.verify_file(path, &hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file downloaded successfully (sha256 {})", file_type, hash);
        Ok(())
    }

    /// Removes a model's files together with their hash records and any
    /// unfinished `.part` downloads.
    pub fn remove_download(&self, name: &str) -> Result<(), ModelError> {
        for path in [
            self.get_model_path(name),
            self.get_tokenizer_path(name),
            self.get_config_path(name),
        ] {
            for path in [Self::record_path(&path), Self::part_path(&path), path] {
                if path.exists() {
                    fs::remove_file(&path)?;
                }
            }
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        log::info!("Checking if model '{}' is downloaded...", info.name);
        if !self.is_model_downloaded(&info.name) {
            log::info!("Model not found, downloading...");
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::info!("Model verification failed, re-downloading...");
            self.remove_download(&info.name)?;
            self.download_model(info).await?;
        } else {
            log::info!("Model verification successful");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        env::temp_dir()
            .join("sentiment-server-tests")
            .join(format!("{}-{}", tag, std::process::id()))
    }

    fn local_info(name: &str) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            model_url: "http://127.0.0.1:9/model.onnx".to_string(),
            tokenizer_url: "http://127.0.0.1:9/tokenizer.json".to_string(),
            config_url: "http://127.0.0.1:9/config.json".to_string(),
            model_hash: None,
            tokenizer_hash: None,
        }
    }

    const MODEL_BYTES: &[u8] = b"onnx bytes";

    /// Lays out a model as a finished download would leave it.
    fn write_files(manager: &ModelManager, name: &str) -> Result<(), io::Error> {
        fs::create_dir_all(manager.models_dir().join(name))?;
        for (path, bytes) in [
            (manager.get_model_path(name), MODEL_BYTES),
            (manager.get_tokenizer_path(name), b"{}".as_slice()),
            (manager.get_config_path(name), b"{}".as_slice()),
        ] {
            fs::write(&path, bytes)?;
            fs::write(ModelManager::record_path(&path), ModelManager::hash_bytes(bytes))?;
        }
        Ok(())
    }

    /// Serves `routes` over HTTP on an ephemeral local port.
    async fn serve_files(routes: Vec<(&'static str, Vec<u8>)>) -> Result<String, io::Error> {
        use axum::{routing::get, Router};

        let mut app = Router::new();
        for (route, body) in routes {
            app = app.route(route, get(move || {
                let body = body.clone();
                async move { body }
            }));
        }
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Ok(format!("http://{}", addr))
    }

    fn served_info(name: &str, base: &str) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            model_url: format!("{}/model.onnx", base),
            tokenizer_url: format!("{}/tokenizer.json", base),
            config_url: format!("{}/config.json", base),
            model_hash: None,
            tokenizer_hash: None,
        }
    }

    fn full_model_bytes() -> Vec<u8> {
        (0..4096u32).flat_map(|i| i.to_le_bytes()).collect()
    }

    #[test]
    fn test_model_paths() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("paths"))?;
        assert!(manager.get_model_path("m").ends_with("m/model.onnx"));
        assert!(manager.get_tokenizer_path("m").ends_with("m/tokenizer.json"));
        assert!(manager.get_config_path("m").ends_with("m/config.json"));
        Ok(())
    }

    #[test]
    fn test_download_state_and_removal() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("state"))?;
        let info = local_info("local");
        manager.remove_download(&info.name)?;
        assert!(!manager.is_model_downloaded(&info.name));
        assert!(!manager.verify_model(&info)?);

        write_files(&manager, &info.name)?;
        assert!(manager.is_model_downloaded(&info.name));
        assert!(manager.verify_model(&info)?);

        manager.remove_download(&info.name)?;
        assert!(!manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[test]
    fn test_hash_verification() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("hash"))?;
        let mut info = local_info("hashed");
        write_files(&manager, &info.name)?;

        info.model_hash = Some(ModelManager::hash_bytes(MODEL_BYTES));
        assert!(manager.verify_model(&info)?);

        fs::write(manager.get_model_path(&info.name), "corrupted data")?;
        assert!(!manager.verify_model(&info)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_existing_files_skip_download() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("skip"))?;
        let info = local_info("cached");
        write_files(&manager, &info.name)?;

        // The URLs point at a closed port, so success means nothing was fetched
        manager.ensure_model_downloaded(&info).await?;
        assert!(manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[tokio::test]
    async fn test_files_without_recorded_hash_are_refetched() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("unrecorded"))?;
        let info = local_info("unrecorded");
        write_files(&manager, &info.name)?;
        fs::remove_file(ModelManager::record_path(&manager.get_model_path(&info.name)))?;

        assert!(!manager.verify_model(&info)?);
        let result = manager.ensure_model_downloaded(&info).await;
        assert!(matches!(result, Err(ModelError::DownloadError(_))));
        assert!(!manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[tokio::test]
    async fn test_truncated_model_is_replaced() -> Result<(), ModelError> {
        let full = full_model_bytes();
        let base = serve_files(vec![
            ("/model.onnx", full.clone()),
            ("/tokenizer.json", b"{\"model\": {}}".to_vec()),
            ("/config.json", b"{\"id2label\": {}}".to_vec()),
        ])
        .await?;
        let manager = ModelManager::new(scratch_dir("truncated"))?;
        let info = served_info("truncated", &base);
        manager.remove_download(&info.name)?;

        manager.ensure_model_downloaded(&info).await?;
        let model_path = manager.get_model_path(&info.name);
        assert_eq!(fs::read(&model_path)?, full);
        assert!(ModelManager::record_path(&model_path).exists());
        assert!(!ModelManager::part_path(&model_path).exists());

        // An interrupted copy: the record names the full file, the bytes stop short
        fs::write(&model_path, &full[..1000])?;
        assert!(manager.is_model_downloaded(&info.name));
        assert!(!manager.verify_model(&info)?);

        manager.ensure_model_downloaded(&info).await?;
        assert_eq!(fs::read(&model_path)?, full);
        assert!(manager.verify_model(&info)?);

        // A truncated file with no record at all is not trusted either
        fs::write(&model_path, &full[..1000])?;
        fs::remove_file(ModelManager::record_path(&model_path))?;
        manager.ensure_model_downloaded(&info).await?;
        assert_eq!(fs::read(&model_path)?, full);
        Ok(())
    }

    #[tokio::test]
    async fn test_pinned_hash_mismatch_leaves_nothing_behind() -> Result<(), ModelError> {
        let base = serve_files(vec![
            ("/model.onnx", full_model_bytes()),
            ("/tokenizer.json", b"{}".to_vec()),
            ("/config.json", b"{}".to_vec()),
        ])
        .await?;
        let manager = ModelManager::new(scratch_dir("mismatch"))?;
        let mut info = served_info("mismatch", &base);
        info.model_hash = Some(ModelManager::hash_bytes(b"some other model"));
        manager.remove_download(&info.name)?;

        let result = manager.download_model(&info).await;
        assert!(matches!(result, Err(ModelError::HashMismatch { .. })));
        let model_path = manager.get_model_path(&info.name);
        assert!(!model_path.exists());
        assert!(!ModelManager::part_path(&model_path).exists());
        assert!(!manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[test]
    fn test_leftover_part_file_is_not_a_download() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("part"))?;
        let info = local_info("part");
        manager.remove_download(&info.name)?;
        fs::create_dir_all(manager.models_dir().join(&info.name))?;
        let model_path = manager.get_model_path(&info.name);
        fs::write(ModelManager::part_path(&model_path), b"half a model")?;

        assert!(!manager.is_model_downloaded(&info.name));
        assert!(!manager.verify_model(&info)?);

        manager.remove_download(&info.name)?;
        assert!(!ModelManager::part_path(&model_path).exists());
        Ok(())
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/cache/m/model.onnx");
        assert_eq!(ModelManager::record_path(path), Path::new("/cache/m/model.onnx.sha256"));
        assert_eq!(ModelManager::part_path(path), Path::new("/cache/m/model.onnx.part"));
    }

    #[tokio::test]
    async fn test_failed_download_cleans_up() -> Result<(), ModelError> {
        let manager = ModelManager::new(scratch_dir("fail"))?;
        let info = local_info("unreachable");
        manager.remove_download(&info.name)?;

        let result = manager.download_model(&info).await;
        assert!(matches!(result, Err(ModelError::DownloadError(_))));
        assert!(!manager.is_model_downloaded(&info.name));
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var(CACHE_ENV_VAR, "/tmp/test-cache");
        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/test-cache/models"));
        env::remove_var(CACHE_ENV_VAR);

        let path = ModelManager::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("sentiment-server/models"));
    }
}
