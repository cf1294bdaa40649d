//! Observability hook for ranked results.

use tracing::info;

use crate::ScoredCandidate;

/// Receives the full ranked list of every run, before relevance filtering.
pub trait RankingObserver: Send + Sync {
    fn on_ranked(&self, nickname: &str, ranked: &[ScoredCandidate]);
}

/// Logs each ranking as one `info` record: `nickname:score` pairs, scores to 4 decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

/// Renders `alice:0.8123, bob:0.5000`.
pub(crate) fn format_ranked(ranked: &[ScoredCandidate]) -> String {
    ranked
        .iter()
        .map(|c| format!("{}:{:.4}", c.nickname, c.score))
        .collect::<Vec<_>>()
        .join(", ")
}

impl RankingObserver for TracingObserver {
    fn on_ranked(&self, nickname: &str, ranked: &[ScoredCandidate]) {
        info!(
            nickname = %nickname,
            count = ranked.len(),
            candidates = %format_ranked(ranked),
            "ranked candidates"
        );
    }
}
