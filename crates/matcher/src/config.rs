//! Match pipeline configuration: options struct and env-based loader.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

/// How the load→append→save sequence is guarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreLocking {
    /// Runs in one pipeline serialize the reload, append and save; no append is lost.
    #[default]
    Exclusive,
    /// No guard: the corpus read at the start of a run is appended to and saved; concurrent
    /// runs can overwrite each other's message (last writer wins).
    None,
}

impl FromStr for StoreLocking {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclusive" | "lock" | "locked" => Ok(StoreLocking::Exclusive),
            "none" | "off" => Ok(StoreLocking::None),
            other => anyhow::bail!("unknown store locking mode: {other} (expected exclusive|none)"),
        }
    }
}

/// Tunables of one [`crate::MatchPipeline`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOptions {
    pub embed_timeout: Duration,
    /// Per-attempt bound on a language-model call.
    pub llm_timeout: Duration,
    pub llm_max_attempts: u32,
    pub locking: StoreLocking,
    /// Reject query embeddings whose dimension differs from the stored corpus.
    pub enforce_dimension: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            embed_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(60),
            llm_max_attempts: 2,
            locking: StoreLocking::Exclusive,
            enforce_dimension: true,
        }
    }
}

/// Match config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvMatchConfig {
    pub data_path: PathBuf,
    pub log_file: PathBuf,
    pub options: MatchOptions,
}

fn parse_var<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid {key}: {raw}")),
        _ => Ok(None),
    }
}

impl EnvMatchConfig {
    /// Load from environment variables. Unset variables take defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        let defaults = MatchOptions::default();
        let data_path = env::var("DATA_PATH").unwrap_or_else(|_| "data/messages.json".to_string());
        let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/app.log".to_string());

        let options = MatchOptions {
            embed_timeout: parse_var::<u64>("EMBED_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.embed_timeout),
            llm_timeout: parse_var::<u64>("LLM_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.llm_timeout),
            llm_max_attempts: parse_var::<u32>("LLM_MAX_ATTEMPTS")?
                .unwrap_or(defaults.llm_max_attempts)
                .max(1),
            locking: parse_var::<StoreLocking>("STORE_LOCKING")?.unwrap_or(defaults.locking),
            enforce_dimension: parse_var::<bool>("ENFORCE_EMBEDDING_DIMENSION")?
                .unwrap_or(defaults.enforce_dimension),
        };

        Ok(Self {
            data_path: PathBuf::from(data_path),
            log_file: PathBuf::from(log_file),
            options,
        })
    }
}
