//! # In-Memory Message Store
//!
//! Non-persistent [`MessageStore`] for tests and development. Counts loads and saves so
//! callers can assert how a pipeline touched the store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Corpus, MessageStore, StoreError};

#[derive(Debug, Clone, Default)]
pub struct InMemoryMessageStore {
    corpus: Arc<RwLock<Corpus>>,
    load_count: Arc<AtomicUsize>,
    save_count: Arc<AtomicUsize>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing corpus.
    pub fn with_corpus(corpus: Corpus) -> Self {
        Self {
            corpus: Arc::new(RwLock::new(corpus)),
            ..Self::default()
        }
    }

    /// Current contents.
    pub async fn snapshot(&self) -> Corpus {
        self.corpus.read().await.clone()
    }

    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn load(&self) -> Result<Corpus, StoreError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.corpus.read().await.clone())
    }

    async fn save(&self, corpus: &Corpus) -> Result<(), StoreError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        *self.corpus.write().await = corpus.clone();
        Ok(())
    }
}
