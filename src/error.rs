//! Error types for the parlance library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`ParlanceError`] enum. Classification itself never fails — bad input
//! degrades to `Intent::Unknown` — so errors only surface from model
//! construction, serialization, and I/O paths.

use std::io;

use anyhow;
use thiserror::Error;

/// The main error type for parlance operations.
#[derive(Error, Debug)]
pub enum ParlanceError {
    /// I/O errors (model files, training data files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Text analysis errors (tokenization, pattern compilation).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Model state errors (shape mismatches, missing sections).
    #[error("Model error: {0}")]
    Model(String),

    /// Training loop errors (insufficient samples, worker shutdown).
    #[error("Training error: {0}")]
    Training(String),

    /// Invalid configuration values.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regular expression compilation errors.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ParlanceError.
pub type Result<T> = std::result::Result<T, ParlanceError>;

impl ParlanceError {
    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        ParlanceError::Analysis(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        ParlanceError::Model(msg.into())
    }

    /// Create a new training error.
    pub fn training<S: Into<String>>(msg: S) -> Self {
        ParlanceError::Training(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ParlanceError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ParlanceError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ParlanceError::analysis("bad pattern");
        assert_eq!(error.to_string(), "Analysis error: bad pattern");

        let error = ParlanceError::model("shape mismatch");
        assert_eq!(error.to_string(), "Model error: shape mismatch");

        let error = ParlanceError::training("not enough samples");
        assert_eq!(error.to_string(), "Training error: not enough samples");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "model file missing");
        let error = ParlanceError::from(io_error);

        match error {
            ParlanceError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
