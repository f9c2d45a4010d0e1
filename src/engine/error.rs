use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced by the removal engine: weight resolution, session
/// construction, inference, and the image plumbing around them.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{operation} failed for {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: ort::Error,
    },

    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("inference error: {0}")]
    Inference(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn io(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn model(operation: impl Into<String>, source: ort::Error) -> Self {
        Self::Model {
            operation: operation.into(),
            source,
        }
    }

    pub fn download(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }
}

/// Fallback for ort errors raised outside a contextual `map_err`.
impl From<ort::Error> for EngineError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "onnx runtime call".to_string(),
            source: err,
        }
    }
}
