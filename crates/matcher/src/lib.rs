//! # Matcher
//!
//! Turns a new message into a "friend for the moment" recommendation.
//!
//! Flow of one [`MatchPipeline::run`]:
//!
//! 1. Validate nickname and text (non-blank after trimming).
//! 2. Embed the text ([`embedding::EmbeddingService`], bounded by a timeout).
//! 3. Load the corpus and rank every stored message by cosine similarity ([`top_k`], K = [`TOP_K`]).
//! 4. Hand the ranked list to the [`RankingObserver`].
//! 5. Ask the language model which of the ranked candidates are truly relevant ([`RelevanceFilter`]).
//! 6. Append the new message and save the corpus. This happens after ranking, so a message never
//!    matches itself.
//!
//! Language-model trouble never fails a run: the filter falls back to the single top-ranked candidate.

mod config;
mod observer;
mod pipeline;
mod ranker;
mod relevance;

pub use config::{EnvMatchConfig, MatchOptions, StoreLocking};
pub use observer::{RankingObserver, TracingObserver};
pub use pipeline::{MatchOutcome, MatchPipeline};
pub use ranker::{cosine_similarity, top_k, ScoredCandidate, TOP_K};
pub use relevance::{parse_selection, RelevanceFilter, SelectionParse};
