//! Error types for the triage library.
//!
//! All failures are represented by the [`TriageError`] enum. There is no
//! recovery layer anywhere in the crate: errors propagate with `?` up to the
//! caller, which reports them and stops.
//!
//! # Examples
//!
//! ```
//! use triage::error::{Result, TriageError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TriageError::dataset("row 3 has 2 columns, expected 3"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for triage operations.
#[derive(Error, Debug)]
pub enum TriageError {
    /// I/O errors (file reads and writes)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Dataset errors (malformed rows, missing files with context)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Schema errors (missing columns, kind mismatches)
    #[error("Schema error: {0}")]
    Schema(String),

    /// Analysis errors (tokenization, filtering)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Pipeline errors (stage wiring, fit/transform misuse)
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Training errors (degenerate inputs, empty label vocabulary)
    #[error("Training error: {0}")]
    Train(String),

    /// Model persistence errors (bad magic, checksum mismatch, version skew)
    #[error("Model error: {0}")]
    Model(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`TriageError`].
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        TriageError::Dataset(msg.into())
    }

    /// Create a new schema error.
    pub fn schema<S: Into<String>>(msg: S) -> Self {
        TriageError::Schema(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TriageError::Analysis(msg.into())
    }

    /// Create a new pipeline error.
    pub fn pipeline<S: Into<String>>(msg: S) -> Self {
        TriageError::Pipeline(msg.into())
    }

    /// Create a new training error.
    pub fn train<S: Into<String>>(msg: S) -> Self {
        TriageError::Train(msg.into())
    }

    /// Create a new model persistence error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        TriageError::Model(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TriageError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TriageError::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = TriageError::dataset("Test dataset error");
        assert_eq!(error.to_string(), "Dataset error: Test dataset error");

        let error = TriageError::schema("Test schema error");
        assert_eq!(error.to_string(), "Schema error: Test schema error");

        let error = TriageError::train("Test training error");
        assert_eq!(error.to_string(), "Training error: Test training error");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let triage_error = TriageError::from(io_error);

        match triage_error {
            TriageError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }
}
