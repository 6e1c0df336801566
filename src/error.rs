use std::path::{Path, PathBuf};

pub type SlideshowResult<T> = Result<T, SlideshowError>;

#[derive(thiserror::Error, Debug)]
pub enum SlideshowError {
    #[error("decode error: {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error("compositing error: {0}")]
    Compositing(String),

    #[error("invalid viewport {width}x{height}")]
    Viewport { width: f64, height: f64 },

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SlideshowError {
    pub fn decode(path: &Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn compositing(msg: impl Into<String>) -> Self {
        Self::Compositing(msg.into())
    }
}

impl From<serde_json::Error> for SlideshowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
