use message_store::StoreError;
use thiserror::Error;

/// Fatal errors of one pipeline run. Language-model failures never appear here; the
/// relevance filter recovers from them locally.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Embedding error: {0}")]
    Embedding(#[source] anyhow::Error),

    #[error("Embedding request timed out after {secs} seconds")]
    EmbeddingTimeout { secs: u64 },

    #[error("Corrupt message store: {0}")]
    CorruptStore(#[source] StoreError),

    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),

    #[error("Embedding dimension mismatch: corpus has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl MatchError {
    /// Stable label for logs and exit messages.
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::Validation(_) => "validation",
            MatchError::Embedding(_) => "embedding",
            MatchError::EmbeddingTimeout { .. } => "embedding_timeout",
            MatchError::CorruptStore(_) => "corrupt_store",
            MatchError::Storage(_) => "storage",
            MatchError::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

impl From<StoreError> for MatchError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Corrupt { .. } => MatchError::CorruptStore(err),
            StoreError::DimensionMismatch { expected, actual } => {
                MatchError::DimensionMismatch { expected, actual }
            }
            StoreError::Io { .. } | StoreError::Encode(_) => MatchError::Storage(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
