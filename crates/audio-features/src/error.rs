//! Feature Extraction Error Types

use thiserror::Error;
use windowing::WindowError;

/// Errors during feature extraction
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    /// A length or kind argument is outside the valid domain
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },

    /// A required auxiliary scalar was not supplied
    #[error("{feature} requires {expected} in the argument vector")]
    MissingArgument {
        feature: &'static str,
        expected: &'static str,
    },

    /// Buffer length inconsistent with the declared size
    #[error("size mismatch: expected length {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Spectrum engine used before initialisation
    #[error("spectrum engine not initialised for frame length {requested}")]
    NotReady { requested: usize },

    /// Frame length outside the transform's supported radices
    #[error("unsupported transform size {size}: must be a power of two")]
    UnsupportedSize { size: usize },
}

impl From<WindowError> for FeatureError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::InvalidLength(_) => FeatureError::InvalidArgument {
                reason: "window length must be at least 1",
            },
            WindowError::LengthMismatch { expected, actual } => {
                FeatureError::SizeMismatch { expected, actual }
            }
        }
    }
}
