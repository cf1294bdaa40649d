//! Match pipeline: embed → rank → observe → filter → append → save.

use std::sync::Arc;

use embedding::EmbeddingService;
use friend_core::{MatchError, Result};
use llm_client::LlmClient;
use message_store::{Corpus, MessageStore, StoredMessage};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::{
    top_k, MatchOptions, RankingObserver, RelevanceFilter, ScoredCandidate, StoreLocking,
    TracingObserver, TOP_K,
};

/// Result of one run: the similarity top-K and the relevance-filtered recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub ranked: Vec<ScoredCandidate>,
    pub recommended: Vec<ScoredCandidate>,
}

/// Orchestrates one match per submitted message. Collaborators are injected at construction.
///
/// Share one pipeline (e.g. behind an `Arc`) per store: the write guard lives here.
pub struct MatchPipeline {
    embedder: Arc<dyn EmbeddingService>,
    store: Arc<dyn MessageStore>,
    filter: RelevanceFilter,
    observer: Arc<dyn RankingObserver>,
    options: MatchOptions,
    write_guard: Mutex<()>,
}

impl MatchPipeline {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        llm: Arc<dyn LlmClient>,
        store: Arc<dyn MessageStore>,
        options: MatchOptions,
    ) -> Self {
        let filter = RelevanceFilter::new(llm, options.llm_timeout, options.llm_max_attempts);
        Self {
            embedder,
            store,
            filter,
            observer: Arc::new(TracingObserver),
            options,
            write_guard: Mutex::new(()),
        }
    }

    /// Replaces the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn RankingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Matches `text` from `nickname` against the corpus, then stores it.
    ///
    /// Dropping the returned future before the final save leaves the corpus unchanged; once the
    /// save has started it completes.
    ///
    /// # Errors
    ///
    /// - [`MatchError::Validation`]: blank nickname or text; nothing external is called.
    /// - [`MatchError::Embedding`] / [`MatchError::EmbeddingTimeout`]: the embedder failed; nothing is stored.
    /// - [`MatchError::CorruptStore`] / [`MatchError::Storage`]: the corpus could not be read or written.
    /// - [`MatchError::DimensionMismatch`]: the query embedding does not fit the corpus (when enforced).
    #[instrument(skip(self, nickname, text), fields(nickname = %nickname.trim()))]
    pub async fn run(&self, nickname: &str, text: &str) -> Result<MatchOutcome> {
        let nickname = nickname.trim();
        let text = text.trim();
        if nickname.is_empty() {
            return Err(MatchError::Validation("nickname must not be empty".to_string()));
        }
        if text.is_empty() {
            return Err(MatchError::Validation("message must not be empty".to_string()));
        }

        let query = self.embed(text).await?;

        let corpus = self.store.load().await?;
        if self.options.enforce_dimension {
            corpus.check_dimension(query.len())?;
        }
        let ranked = top_k(&query, &corpus, TOP_K);
        info!(
            corpus_size = corpus.len(),
            ranked = ranked.len(),
            "step: ranking done"
        );

        self.observer.on_ranked(nickname, &ranked);

        let recommended = self.filter.filter(text, &ranked).await;

        self.append(corpus, StoredMessage::new(nickname, text, query))
            .await?;
        info!(nickname = %nickname, message = %text, "ADD message");

        Ok(MatchOutcome {
            ranked,
            recommended,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let timeout = self.options.embed_timeout;
        let query = match tokio::time::timeout(timeout, self.embedder.embed(text)).await {
            Ok(Ok(query)) => query,
            Ok(Err(e)) => {
                warn!(error = %e, "embedding failed");
                return Err(MatchError::Embedding(e));
            }
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "embedding timed out");
                return Err(MatchError::EmbeddingTimeout {
                    secs: timeout.as_secs(),
                });
            }
        };
        if query.is_empty() {
            return Err(MatchError::Embedding(anyhow::anyhow!(
                "embedding service returned an empty vector"
            )));
        }
        Ok(query)
    }

    /// Appends `message` and saves. With [`StoreLocking::Exclusive`] the corpus is re-read under
    /// the write guard so appends from concurrent runs are kept.
    async fn append(&self, loaded: Corpus, message: StoredMessage) -> Result<()> {
        match self.options.locking {
            StoreLocking::Exclusive => {
                let _guard = self.write_guard.lock().await;
                let mut latest = self.store.load().await?;
                self.push(&mut latest, message)?;
                self.store.save(&latest).await?;
            }
            StoreLocking::None => {
                let mut corpus = loaded;
                self.push(&mut corpus, message)?;
                self.store.save(&corpus).await?;
            }
        }
        Ok(())
    }

    fn push(&self, corpus: &mut Corpus, message: StoredMessage) -> Result<()> {
        if self.options.enforce_dimension {
            corpus.push(message)?;
        } else {
            corpus.push_unchecked(message);
        }
        Ok(())
    }
}
