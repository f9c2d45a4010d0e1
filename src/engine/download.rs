//! Model weight resolution.
//!
//! Weights live in a per-user models directory and are fetched from the
//! release bucket on first use. Downloads go to a `.part` file and are
//! renamed into place only once complete, so an interrupted fetch never
//! leaves a half-written `.onnx` behind.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::catalog::ModelKind;
use super::error::{EngineError, Result};
use crate::log_info;

/// Overrides the default models directory when set to a non-empty path.
pub const MODEL_DIR_ENV: &str = "CLEARCUT_MODEL_DIR";

/// Directory the `.onnx` weights are stored in.
///
/// `$CLEARCUT_MODEL_DIR` wins when set; otherwise the per-user cache
/// directory (`~/.cache/ClearCut/models` on Linux).
pub fn models_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(MODEL_DIR_ENV)
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    default_models_dir()
}

fn default_models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ClearCut")
        .join("models")
}

pub fn weight_path(kind: ModelKind) -> PathBuf {
    models_dir().join(kind.spec().weight_file)
}

/// Returns the local path of the model's weights, downloading them first
/// if they are not cached yet.
pub fn ensure_weights(kind: ModelKind) -> Result<PathBuf> {
    let path = weight_path(kind);
    if path.exists() {
        return Ok(path);
    }
    fetch_weights(kind, &path)?;
    Ok(path)
}

fn fetch_weights(kind: ModelKind, dest: &Path) -> Result<()> {
    let url = kind.weight_url();
    log_info!("Downloading weights for {}  ({})", kind.identifier(), url);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| EngineError::io("create models directory", parent, e))?;
    }

    let part = partial_path(dest);
    match download_to(&url, &part) {
        Ok(()) => {
            fs::rename(&part, dest)
                .map_err(|e| EngineError::io("move downloaded weights into place", dest, e))?;
            log_info!("Stored weights at {}", dest.display());
            Ok(())
        }
        Err(e) => {
            // Leave no partial file behind on failure
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn download_to(url: &str, dest: &Path) -> Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .map_err(|e| EngineError::download(url, e))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| EngineError::download(url, e))?;

    if !response.status().is_success() {
        return Err(EngineError::download(
            url,
            format!("HTTP {}", response.status()),
        ));
    }

    let file = File::create(dest).map_err(|e| EngineError::io("create weights file", dest, e))?;
    let mut writer = BufWriter::new(file);
    response
        .copy_to(&mut writer)
        .map_err(|e| EngineError::download(url, e))?;

    Ok(())
}
