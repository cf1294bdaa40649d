//! # Core Types
//!
//! ## StoredMessage
//!
//! One submitted message with its embedding. Serialized field names (`nickname`, `message`,
//! `embedding`, `created_at`) are the on-disk format and must not change.
//!
//! ## Corpus
//!
//! Ordered sequence of stored messages, serialized as a flat JSON array.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// A single submitted message. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Submitter's nickname
    pub nickname: String,
    /// The message text
    #[serde(rename = "message")]
    pub text: String,
    /// Embedding of `text`, single precision.
    ///
    /// Files written by other producers may carry double-precision values; they are rounded to
    /// the nearest `f32` on load and written back rounded, so a load then save of such a file
    /// is not byte-identical. Ranking accuracy is unaffected at embedding scale.
    pub embedding: Vec<f32>,
    /// Submission time, UTC, microsecond precision
    #[serde(with = "iso_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    /// Creates a message stamped with the current time.
    pub fn new(nickname: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self::with_created_at(nickname, text, embedding, Utc::now())
    }

    /// Creates a message with an explicit timestamp, truncated to the precision the file format keeps.
    pub fn with_created_at(
        nickname: impl Into<String>,
        text: impl Into<String>,
        embedding: Vec<f32>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            text: text.into(),
            embedding,
            created_at: created_at.trunc_subsecs(6),
        }
    }
}

/// Submission-ordered messages. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Corpus {
    messages: Vec<StoredMessage>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[StoredMessage] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredMessage> {
        self.messages.iter()
    }

    /// Dimension of the first stored embedding; `None` for an empty corpus.
    pub fn dimension(&self) -> Option<usize> {
        self.messages.first().map(|m| m.embedding.len())
    }

    /// Checks that an embedding of `actual` length may join this corpus.
    pub fn check_dimension(&self, actual: usize) -> Result<(), StoreError> {
        match self.dimension() {
            Some(expected) if expected != actual => {
                Err(StoreError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    /// Appends a message, rejecting one whose embedding dimension differs from the corpus.
    pub fn push(&mut self, message: StoredMessage) -> Result<(), StoreError> {
        self.check_dimension(message.embedding.len())?;
        self.messages.push(message);
        Ok(())
    }

    /// Appends without the dimension check.
    pub fn push_unchecked(&mut self, message: StoredMessage) {
        self.messages.push(message);
    }

    /// The newest `limit` messages, newest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &StoredMessage> {
        self.messages.iter().rev().take(limit)
    }
}

/// `created_at` is written as naive UTC ISO-8601 with microseconds (`2024-05-01T10:00:00.123456`).
/// Reading also accepts RFC 3339 with an explicit offset and naive values without a fraction.
mod iso_timestamp {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::custom(format!("invalid created_at: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>()
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}
