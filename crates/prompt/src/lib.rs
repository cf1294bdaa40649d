//! # Prompt
//!
//! Chat message types shared by LLM clients, and the prompt that asks a language model which
//! similarity-ranked candidates are truly relevant to a new message.
//!
//! ## Relevance prompt format
//!
//! Candidates are listed one per line with their 1-based position:
//!
//! ```text
//! 1. nickname=alice | message=feeling anxious about exams | score=0.8123
//! ```
//!
//! The model is told to answer with JSON only, `{"selected": [..]}`, using those positions.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// One candidate as shown to the model.
#[derive(Debug, Clone, Copy)]
pub struct CandidateLine<'a> {
    pub nickname: &'a str,
    pub message: &'a str,
    pub score: f32,
}

/// JSON key the model must answer with.
pub const SELECTED_KEY: &str = "selected";

/// Formats one candidate line; `position` is 1-based.
pub fn format_candidate_line(position: usize, candidate: &CandidateLine<'_>) -> String {
    format!(
        "{}. nickname={} | message={} | score={:.4}",
        position, candidate.nickname, candidate.message, candidate.score
    )
}

/// Builds the relevance-judgment prompt for `user_message` over `candidates` (in ranked order).
///
/// The allowed index range in the instructions follows the number of candidates given.
pub fn format_relevance_prompt<'a, I>(user_message: &str, candidates: I) -> String
where
    I: IntoIterator<Item = CandidateLine<'a>>,
{
    let lines: Vec<String> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| format_candidate_line(i + 1, &c))
        .collect();
    let count = lines.len();

    let mut out = String::new();
    out.push_str("You are helping match people with similar thoughts.\n");
    out.push_str("User message:\n");
    out.push_str(user_message);
    out.push_str("\n\n");
    out.push_str(&format!("Top-{} candidates:\n", count));
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("\nTask:\n");
    out.push_str("Select which candidates are truly relevant for \"friend for the moment\".\n");
    out.push_str("Return ONLY JSON in this format:\n");
    out.push_str(&format!("{{\"{}\": [1, 2]}}\n", SELECTED_KEY));
    out.push_str(&format!(
        "Where numbers refer to candidate indices 1..{}.\n",
        count
    ));
    out.push_str(&format!(
        "If none are relevant, return {{\"{}\": []}}.\n",
        SELECTED_KEY
    ));
    out
}
