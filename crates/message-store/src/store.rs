//! The `MessageStore` trait: whole-corpus read and overwrite.

use async_trait::async_trait;

use crate::{Corpus, StoreError};

/// Repository of previously submitted messages.
///
/// The corpus is read in full and rewritten in full; implementations never edit or delete
/// individual messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Returns the persisted corpus, or an empty one when nothing has been persisted yet.
    async fn load(&self) -> Result<Corpus, StoreError>;

    /// Replaces the persisted corpus. A failed or interrupted save leaves the previous state readable.
    async fn save(&self, corpus: &Corpus) -> Result<(), StoreError>;
}
