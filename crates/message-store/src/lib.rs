//! # Message Store
//!
//! Durable corpus of previously submitted messages and their embeddings.
//!
//! - [`StoredMessage`] / [`Corpus`]: the append-only data model; insertion order is submission order.
//! - [`MessageStore`]: `load` the whole corpus, `save` it back wholesale.
//! - [`JsonFileStore`]: the persisted format, a flat JSON array of
//!   `{nickname, message, embedding, created_at}` records, replaced atomically on save.
//! - [`InMemoryMessageStore`]: non-persistent store for tests and development.
//!
//! ## Corpus invariant
//!
//! All embeddings in one corpus share a dimensionality. [`Corpus::push`] enforces it on append;
//! corpora loaded from disk are taken as they are, since older files were never checked.

mod error;
mod inmemory;
mod json_store;
mod store;
mod types;

pub use error::StoreError;
pub use inmemory::InMemoryMessageStore;
pub use json_store::JsonFileStore;
pub use store::MessageStore;
pub use types::{Corpus, StoredMessage};
