//! Store error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading, saving or appending to a corpus.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Persisted state exists but is not a JSON array of message records.
    #[error("corpus at {path} cannot be parsed: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corpus cannot be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("embedding dimension mismatch: corpus has {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
