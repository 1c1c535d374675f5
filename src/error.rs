//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type used throughout the crate.
pub type Result<T, E = TokmergeError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while loading, merging, or writing tokenizer documents.
#[derive(Debug, Error)]
pub enum TokmergeError {
    /// A tokenizer document lacks required structure (vocabulary, merges, or valid ids).
    #[error("invalid tokenizer document: {0}")]
    Validation(String),
    /// A merge entry is neither a two-token array nor a two-token string.
    #[error("malformed merge entry: {0}")]
    Format(String),
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TokmergeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl TokmergeError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
