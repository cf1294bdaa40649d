//! # Text Embeddings
//!
//! This crate defines the embedding service interface. The match pipeline consumes it as a
//! black box: text in, fixed-dimension vector out.

use async_trait::async_trait;

mod config;
pub use config::{EmbeddingConfig, EnvEmbeddingConfig, DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL};

/// Service for generating text embeddings.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Generates an embedding vector for a single text string.
    ///
    /// Every call within one deployment returns vectors of the same dimension.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error>;
}
