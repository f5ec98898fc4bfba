//! Error types for the DQE triage pipeline.
//!
//! Every failure the pipeline can surface is a variant of [`DqeError`]. The
//! variants are grouped by how far the failure is allowed to travel: per-sample
//! errors are skipped by callers, mission errors abort only the current
//! mission, and configuration errors stop a model from being constructed.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for triage operations.
#[derive(Debug, Error)]
pub enum DqeError {
    /// Missing, empty or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Sample channel keyword differs from the model affinity
    #[error("Keyword not match: input {input}, model {model}")]
    KeywordMismatch { input: String, model: String },

    /// Input path does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Input path exists but is not a regular file
    #[error("Expected a file: {}", .0.display())]
    NotAFile(PathBuf),

    /// Image buffer could not be decoded
    #[error("File broken: {} ({message})", path.display())]
    Decode { path: PathBuf, message: String },

    /// File name does not follow the capture naming convention
    #[error("Cannot parse file name '{name}': {message}")]
    Parse { name: String, message: String },

    /// Mission preconditions violated (missing pair, vocabulary mismatch)
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Zero or several candidate disks on the test bench
    #[error("Ambiguous test bench: expected one testing disk, found {}: {candidates:?}", candidates.len())]
    GroundTruthAmbiguity { candidates: Vec<String> },

    /// Capability not available on this host
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Classifier backend failure
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// Workbook generation failure
    #[error("Report error: {0}")]
    Report(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DqeError {
    /// Per-sample failures that callers skip instead of aborting.
    pub fn is_sample_error(&self) -> bool {
        matches!(
            self,
            DqeError::NotFound(_)
                | DqeError::NotAFile(_)
                | DqeError::Decode { .. }
                | DqeError::Parse { .. }
                | DqeError::KeywordMismatch { .. }
        )
    }
}

impl From<serde_json::Error> for DqeError {
    fn from(err: serde_json::Error) -> Self {
        DqeError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for DqeError {
    fn from(err: toml::de::Error) -> Self {
        DqeError::Config(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for DqeError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        DqeError::Report(err.to_string())
    }
}

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, DqeError>;
