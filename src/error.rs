use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the emotion classification pipeline
#[derive(Debug, Error)]
pub enum EmotionError {
    /// Unparseable, empty, or near-silent input. Recovered at the boundary
    /// by returning a `valid=false` result instead of attempting inference.
    #[error("Invalid audio input: {0}")]
    InvalidAudio(String),

    /// Contract violation between feature extractor, scaler, and classifier.
    /// Indicates artifact/config drift, not a user error.
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Inference attempted without a successfully loaded artifact bundle
    #[error("Model bundle not loaded at path: {0}")]
    ModelNotLoaded(PathBuf),

    /// Artifact bundle exists but fails parsing or cross-validation
    #[error("Invalid model bundle: {0}")]
    InvalidBundle(String),

    /// Resampling failure while converting to the target sample rate
    #[error("Resampling failed: {0}")]
    ResampleError(String),
}

impl EmotionError {
    /// Whether this error is recoverable as a `valid=false` result.
    /// Everything else implies a deployment bug and should surface loudly.
    pub fn is_invalid_audio(&self) -> bool {
        matches!(self, EmotionError::InvalidAudio(_))
    }
}
