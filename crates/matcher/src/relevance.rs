//! Relevance filter: asks the language model which ranked candidates are truly relevant.
//!
//! The model is expected to answer `{"selected": [..]}` with 1-based candidate positions.
//! Positions outside `1..=len` are dropped, repeated positions keep their first occurrence, and
//! the output follows the order of the answer. When the answer cannot be parsed, or the model
//! cannot be reached within the configured attempts, the filter returns only the top-ranked
//! candidate.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use llm_client::LlmClient;
use prompt::{format_relevance_prompt, CandidateLine};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::ScoredCandidate;

/// Outcome of parsing a model answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionParse {
    /// Positions as the model listed them (unvalidated, 1-based). Integers beyond the `i64`
    /// range saturate to `i64::MIN` / `i64::MAX`, which no candidate list reaches.
    Selected(Vec<i64>),
    /// The answer is not `{"selected": [int, ...]}`; carries the reason.
    ParseFailure(String),
}

#[derive(Deserialize)]
struct SelectionAnswer {
    selected: Vec<serde_json::Number>,
}

/// Integer value of a JSON number, saturated to the `i64` range; `None` for fractional numbers.
///
/// Integer literals too large for `u64` arrive as `f64`, so an integral float of magnitude
/// `2^63` or more counts as an oversized integer. Smaller floats (`1.0`, `1.5`) are rejected.
fn integer_position(n: &serde_json::Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    if n.is_u64() {
        return Some(i64::MAX);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() >= 9_223_372_036_854_775_808.0 {
        Some(if f > 0.0 { i64::MAX } else { i64::MIN })
    } else {
        None
    }
}

/// Strips surrounding whitespace and one Markdown code fence (```` ```json ... ``` ````).
fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line.
    match body.split_once('\n') {
        Some((info, inner)) if !info.trim_start().starts_with('{') => inner.trim(),
        _ => body.trim(),
    }
}

/// Parses a model answer into the positions it selects.
pub fn parse_selection(answer: &str) -> SelectionParse {
    let body = strip_code_fence(answer);
    if body.is_empty() {
        return SelectionParse::ParseFailure("empty answer".to_string());
    }
    let parsed = match serde_json::from_str::<SelectionAnswer>(body) {
        Ok(parsed) => parsed,
        Err(e) => return SelectionParse::ParseFailure(e.to_string()),
    };
    let mut positions = Vec::with_capacity(parsed.selected.len());
    for n in &parsed.selected {
        match integer_position(n) {
            Some(p) => positions.push(p),
            None => return SelectionParse::ParseFailure(format!("non-integer index {n}")),
        }
    }
    SelectionParse::Selected(positions)
}

/// Maps selected positions to candidates: out-of-range positions dropped, first occurrence wins.
fn apply_selection(positions: &[i64], candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
    let mut seen = HashSet::new();
    positions
        .iter()
        .filter_map(|&p| usize::try_from(p).ok())
        .filter(|&p| (1..=candidates.len()).contains(&p))
        .filter(|&p| seen.insert(p))
        .map(|p| candidates[p - 1].clone())
        .collect()
}

/// Single top-ranked candidate; the degraded-mode answer.
fn fallback(candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
    candidates.iter().take(1).cloned().collect()
}

/// Narrows a ranked candidate list with a language-model judgment.
#[derive(Clone)]
pub struct RelevanceFilter {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
    max_attempts: u32,
}

impl RelevanceFilter {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration, max_attempts: u32) -> Self {
        Self {
            llm,
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Returns the subset of `candidates` the model judges relevant to `query`.
    ///
    /// An empty candidate list returns immediately without calling the model.
    #[instrument(skip(self, query, candidates), fields(candidate_count = candidates.len()))]
    pub async fn filter(&self, query: &str, candidates: &[ScoredCandidate]) -> Vec<ScoredCandidate> {
        if candidates.is_empty() {
            debug!("no candidates, skipping relevance judgment");
            return Vec::new();
        }

        let prompt = format_relevance_prompt(
            query,
            candidates.iter().map(|c| CandidateLine {
                nickname: &c.nickname,
                message: &c.text,
                score: c.score,
            }),
        );

        let Some(answer) = self.ask(&prompt).await else {
            warn!("language model unavailable, falling back to top-ranked candidate");
            return fallback(candidates);
        };

        match parse_selection(&answer) {
            SelectionParse::Selected(positions) => {
                let selected = apply_selection(&positions, candidates);
                info!(
                    answer_positions = ?positions,
                    selected_count = selected.len(),
                    "step: relevance judgment done"
                );
                selected
            }
            SelectionParse::ParseFailure(reason) => {
                warn!(
                    reason = %reason,
                    answer = %answer,
                    "unparseable relevance answer, falling back to top-ranked candidate"
                );
                fallback(candidates)
            }
        }
    }

    /// Calls the model up to `max_attempts` times; `None` when every attempt failed or timed out.
    async fn ask(&self, prompt: &str) -> Option<String> {
        for attempt in 1..=self.max_attempts {
            match tokio::time::timeout(self.timeout, self.llm.complete(prompt)).await {
                Ok(Ok(answer)) => return Some(answer),
                Ok(Err(e)) => {
                    warn!(attempt, max_attempts = self.max_attempts, error = %e, "language model call failed");
                }
                Err(_) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        timeout_ms = self.timeout.as_millis() as u64,
                        "language model call timed out"
                    );
                }
            }
        }
        None
    }
}
