//! Plain-text rendering of pipeline results and stored messages.

use matcher::MatchOutcome;
use message_store::Corpus;

const CONTENT_PREVIEW_LEN: usize = 80;

/// Ranked list with scores, then the recommendation (or a note that there is none).
pub fn render_outcome(outcome: &MatchOutcome) -> String {
    let mut out = String::new();
    if outcome.ranked.is_empty() {
        out.push_str("No earlier messages yet. Yours is saved for the next person.\n");
        return out;
    }

    out.push_str(&format!("Top-{} by cosine similarity:\n", outcome.ranked.len()));
    for (i, c) in outcome.ranked.iter().enumerate() {
        out.push_str(&format!("  {}. {} ({:.4})\n     {}\n", i + 1, c.nickname, c.score, c.text));
    }

    out.push_str("\nFriend recommendation:\n");
    if outcome.recommended.is_empty() {
        out.push_str("  No strong recommendation.\n");
    }
    for c in &outcome.recommended {
        out.push_str(&format!("  - {}\n     {}\n", c.nickname, c.text));
    }
    out
}

/// Newest `limit` messages as a table, newest first.
pub fn render_recent(corpus: &Corpus, limit: usize) -> String {
    if corpus.is_empty() {
        return "No messages stored.\n".to_string();
    }
    let mut out = format!(
        "{:<26} {:<16} {:<6} {}\n{}\n",
        "created_at",
        "nickname",
        "dim",
        "message",
        "-".repeat(100)
    );
    for m in corpus.recent(limit) {
        let preview: String = m.text.chars().take(CONTENT_PREVIEW_LEN).collect();
        out.push_str(&format!(
            "{:<26} {:<16} {:<6} {}\n",
            m.created_at.format("%Y-%m-%d %H:%M:%S"),
            m.nickname,
            m.embedding.len(),
            preview.replace('\n', " ")
        ));
    }
    out
}
