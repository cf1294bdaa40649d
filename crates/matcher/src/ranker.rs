//! Similarity ranking: cosine similarity and stable top-K.

use std::cmp::Ordering;

use message_store::{Corpus, StoredMessage};
use serde::{Deserialize, Serialize};

/// Number of candidates the pipeline ranks.
pub const TOP_K: usize = 3;

/// A stored message scored against a query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub nickname: String,
    #[serde(rename = "message")]
    pub text: String,
    pub score: f32,
}

impl ScoredCandidate {
    fn scored(message: &StoredMessage, score: f32) -> Self {
        Self {
            nickname: message.nickname.clone(),
            text: message.text.clone(),
            score,
        }
    }
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`, clamped to `[-1, 1]`.
///
/// Returns `0.0` when either vector has zero norm, when the lengths differ, or when the
/// result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    let score = dot / denom;
    if !score.is_finite() {
        return 0.0;
    }
    score.clamp(-1.0, 1.0) as f32
}

/// Scores every message in `corpus` against `query` and keeps the best `k`, highest first.
///
/// Equal scores keep corpus insertion order, so repeated calls on the same input agree.
pub fn top_k(query: &[f32], corpus: &Corpus, k: usize) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = corpus
        .iter()
        .map(|message| ScoredCandidate::scored(message, cosine_similarity(query, &message.embedding)))
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}
