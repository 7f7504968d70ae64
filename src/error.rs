use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the detection core.
///
/// Degenerate regions (zero width or height) are not represented here: they are
/// rejected where they are found and never abort an image.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Empty image, mismatched image/mask dimensions or an unreadable template directory.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Validation was requested without any reference template to compare against.
    #[error("no templates loaded from {}", dir.display())]
    NoTemplatesLoaded { dir: PathBuf },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
