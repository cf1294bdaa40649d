//! Embedding configuration: trait and env-based implementation.

use anyhow::Result;
use std::env;

/// Mistral's OpenAI-compatible API; used when `OPENAI_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mistral-embed";

/// Embedding service configuration interface.
pub trait EmbeddingConfig: Send + Sync {
    fn api_key(&self) -> &str;
    /// Base URL of an OpenAI-compatible `/embeddings` endpoint.
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
}

/// Embedding config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvEmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
}

impl EmbeddingConfig for EnvEmbeddingConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> &str {
        &self.base_url
    }
    fn model(&self) -> &str {
        &self.embedding_model
    }
}

impl EnvEmbeddingConfig {
    /// Load from environment variables: `MISTRAL_API_KEY` (or `OPENAI_API_KEY`),
    /// `OPENAI_BASE_URL`, `EMBEDDING_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("MISTRAL_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        let base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let embedding_model = env::var("EMBEDDING_MODEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        Ok(Self {
            api_key,
            base_url,
            embedding_model,
        })
    }

    /// Validate config: an API key is required.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("MISTRAL_API_KEY or OPENAI_API_KEY must be set for embeddings");
        }
        Ok(())
    }
}
