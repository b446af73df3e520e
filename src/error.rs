use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatermarkError {
    #[error("Failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported image format: {0:?} (expected .png, .jpg or .jpeg)")]
    UnsupportedFormat(PathBuf),

    #[error("Please upload the image you want to watermark first.")]
    NoImage,

    #[error("Please enter the text you would like to use as your watermark.")]
    EmptyText,

    #[error("Failed to load font {path:?}: {reason}")]
    FontLoad { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to save image {path:?}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    Config(#[from] toml_edit::de::Error),
}

impl WatermarkError {
    /// Conditions caused by what the user did (or didn't) enter. These are
    /// reported as a notice rather than as a failure.
    pub fn is_user_input(&self) -> bool {
        matches!(self, WatermarkError::NoImage | WatermarkError::EmptyText)
    }
}

pub type Result<T> = std::result::Result<T, WatermarkError>;
