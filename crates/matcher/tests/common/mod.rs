//! Test doubles for the match pipeline: embedders, a scripted language model, and a recording observer.
//! No network access.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use embedding::EmbeddingService;
use llm_client::LlmClient;
use matcher::{MatchOptions, RankingObserver, ScoredCandidate};

const VOCABULARY: [&str; 6] = ["exam", "stress", "anxious", "sleep", "pizza", "music"];

/// Bag-of-stems embedder: one dimension per vocabulary stem, counting words that start with it.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    VOCABULARY
        .iter()
        .map(|stem| {
            lower
                .split_whitespace()
                .filter(|word| word.starts_with(stem))
                .count() as f32
        })
        .collect()
}

#[async_trait]
impl EmbeddingService for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(keyword_vector(text))
    }
}

/// Always fails, as a network error would.
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingService for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Err(anyhow::anyhow!("connection reset by peer"))
    }
}

/// Never answers.
pub struct HangingEmbedder;

#[async_trait]
impl EmbeddingService for HangingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

/// Returns a fixed vector regardless of input.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingService for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, anyhow::Error> {
        Ok(self.0.clone())
    }
}

/// What the scripted model does on one call.
pub enum Reply {
    Answer(&'static str),
    Fail(&'static str),
    Hang,
}

/// Language model that plays back scripted replies, then repeats `default` once the script runs out.
pub struct ScriptedLlm {
    script: Mutex<VecDeque<Reply>>,
    default: &'static str,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn answering(default: &'static str) -> Self {
        Self::with_script(Vec::new(), default)
    }

    pub fn with_script(script: Vec<Reply>, default: &'static str) -> Self {
        Self {
            script: Mutex::new(script.into()),
            default,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Reply::Answer(text)) => Ok(text.to_string()),
            Some(Reply::Fail(reason)) => Err(anyhow::anyhow!(reason)),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            None => Ok(self.default.to_string()),
        }
    }
}

/// Records every ranked list it is given.
#[derive(Default)]
pub struct RecordingObserver {
    pub seen: Mutex<Vec<(String, Vec<ScoredCandidate>)>>,
}

impl RankingObserver for RecordingObserver {
    fn on_ranked(&self, nickname: &str, ranked: &[ScoredCandidate]) {
        self.seen
            .lock()
            .unwrap()
            .push((nickname.to_string(), ranked.to_vec()));
    }
}

/// Options with short timeouts so failure paths finish quickly.
pub fn fast_options() -> MatchOptions {
    MatchOptions {
        embed_timeout: Duration::from_millis(200),
        llm_timeout: Duration::from_millis(200),
        llm_max_attempts: 2,
        ..MatchOptions::default()
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
