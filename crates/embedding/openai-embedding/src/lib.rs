//! # OpenAI-compatible Embedding Service
//!
//! Implements [`EmbeddingService`] over any OpenAI-compatible `/embeddings` endpoint.
//! The default deployment points it at Mistral (`mistral-embed`, 1024 dimensions).
//!
//! ## Example
//!
//! ```rust,no_run
//! use openai_embedding::OpenAIEmbedding;
//! use embedding::EmbeddingService;
//!
//! async fn example() -> Result<(), anyhow::Error> {
//!     let service = OpenAIEmbedding::new(
//!         "key".to_string(),
//!         "mistral-embed".to_string(),
//!         "https://api.mistral.ai/v1",
//!     );
//!     let embedding = service.embed("feeling anxious about exams").await?;
//!     println!("Embedding dimension: {}", embedding.len());
//!     Ok(())
//! }
//! ```
//!
//! Timeouts are not applied here; the caller decides how long an embedding may take.

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use async_trait::async_trait;
use embedding::{EmbeddingConfig, EmbeddingService};
use tracing::{debug, info, instrument, warn};

const LOG_PREVIEW_LEN: usize = 200;

/// Embedding service backed by async-openai. Holds the client and model name.
#[derive(Debug, Clone)]
pub struct OpenAIEmbedding {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIEmbedding {
    /// Creates a service sending requests for `model` to `base_url`.
    pub fn new(api_key: String, model: String, base_url: &str) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if !base_url.is_empty() {
            openai_config = openai_config.with_api_base(base_url);
        }
        Self {
            client: Client::with_config(openai_config),
            model,
        }
    }

    /// Creates a service from an [`EmbeddingConfig`].
    pub fn from_config(config: &dyn EmbeddingConfig) -> Self {
        Self::new(
            config.api_key().to_string(),
            config.model().to_string(),
            config.base_url(),
        )
    }

    /// Sets a different embedding model.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Returns the embedding model name (for tests and diagnostics).
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// First `LOG_PREVIEW_LEN` characters of `text`, cut on a char boundary.
fn preview(text: &str) -> String {
    match text.char_indices().nth(LOG_PREVIEW_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl EmbeddingService for OpenAIEmbedding {
    /// Sends one `/embeddings` request and returns the first vector of the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built, the API call fails (auth, network,
    /// rate limit), or the response carries no embedding.
    #[instrument(skip(self, text), fields(model = %self.model, text_len = text.len()))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        info!(
            model = %self.model,
            text_preview = %preview(text),
            "step: embedding request"
        );

        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.clone())
            .input(vec![text])
            .build()?;

        let response = match self.client.embeddings().create(request).await {
            Ok(r) => {
                debug!("embedding response received");
                r
            }
            Err(e) => {
                warn!(error = %e, "embedding request failed");
                return Err(e.into());
            }
        };

        let embedding = match response.data.into_iter().next() {
            Some(item) => item.embedding,
            None => {
                warn!("embedding response has no data");
                return Err(anyhow::anyhow!("No embedding in response"));
            }
        };

        info!(dimension = embedding.len(), "step: embedding done");
        Ok(embedding)
    }
}
