//! Model file management: download from `HuggingFace` and path resolution.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::types::TranscriptionError;

/// Default `HuggingFace` repository holding an ONNX export of wav2vec2-large-960h.
pub const DEFAULT_HF_REPO: &str = "onnx-community/wav2vec2-large-960h";

/// ONNX graph, relative to the model directory.
pub const MODEL_FILE: &str = "onnx/model.onnx";
/// Token → id map.
pub const VOCAB_FILE: &str = "vocab.json";
/// Feature extractor settings.
pub const PREPROCESSOR_FILE: &str = "preprocessor_config.json";

/// Required model files.
const MODEL_FILES: &[&str] = &[MODEL_FILE, VOCAB_FILE, PREPROCESSOR_FILE];

/// Resolved locations of the files the engine loads.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// ONNX graph.
    pub model: PathBuf,
    /// `vocab.json`.
    pub vocab: PathBuf,
    /// `preprocessor_config.json`.
    pub preprocessor: PathBuf,
}

impl ModelPaths {
    /// Resolve every model file under `model_dir`.
    pub fn from_dir(model_dir: &Path) -> Self {
        Self {
            model: model_dir.join(MODEL_FILE),
            vocab: model_dir.join(VOCAB_FILE),
            preprocessor: model_dir.join(PREPROCESSOR_FILE),
        }
    }
}

/// Default model cache directory under ~/.asr/models/.
pub fn default_model_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".asr")
        .join("models")
        .join("wav2vec2-large-960h")
}

/// Check if all required model files exist locally.
pub fn is_model_cached(model_dir: impl AsRef<Path>) -> bool {
    let dir = model_dir.as_ref();
    MODEL_FILES.iter().all(|name| dir.join(name).exists())
}

/// Download model files from `HuggingFace` if not already cached.
pub async fn ensure_model(
    model_dir: impl AsRef<Path>,
    repo: &str,
) -> Result<(), TranscriptionError> {
    let model_dir = model_dir.as_ref().to_path_buf();

    if is_model_cached(&model_dir) {
        debug!("model files already cached at {}", model_dir.display());
        return Ok(());
    }

    info!(repo, "downloading acoustic model from HuggingFace...");
    std::fs::create_dir_all(&model_dir)?;

    // hf-hub's sync API blocks on HTTP
    let dir = model_dir.clone();
    let repo = repo.to_string();
    tokio::task::spawn_blocking(move || download_model_files(&dir, &repo))
        .await
        .map_err(|e| TranscriptionError::ModelNotAvailable(format!("task join error: {e}")))?
}

fn download_model_files(model_dir: &Path, repo_id: &str) -> Result<(), TranscriptionError> {
    let api = hf_hub::api::sync::Api::new()
        .map_err(|e| TranscriptionError::ModelNotAvailable(format!("HF API init: {e}")))?;
    let repo = api.model(repo_id.to_string());

    for &filename in MODEL_FILES {
        let target = model_dir.join(filename);
        if target.exists() {
            debug!("skipping {filename} (already exists)");
            continue;
        }

        info!("downloading {filename}...");
        match repo.get(filename) {
            Ok(cached_path) => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                if cached_path != target {
                    let _ = std::fs::copy(&cached_path, &target).map_err(|e| {
                        TranscriptionError::ModelNotAvailable(format!(
                            "failed to copy {filename}: {e}"
                        ))
                    })?;
                }
                debug!("downloaded {filename}");
            }
            Err(e) => {
                warn!("failed to download {filename}: {e}");
                return Err(TranscriptionError::ModelNotAvailable(format!(
                    "download failed for {filename}: {e}"
                )));
            }
        }
    }

    info!("all model files ready at {}", model_dir.display());
    Ok(())
}
