//! LLM configuration: trait and env-based implementation.

use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_LLM_MODEL: &str = "mistral-small-latest";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

/// LLM configuration interface for OpenAI-compatible APIs.
pub trait LlmConfig: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn model(&self) -> &str;
    fn temperature(&self) -> f32;
    fn system_prompt(&self) -> Option<&str>;
}

/// LLM config loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_system_prompt: Option<String>,
}

impl LlmConfig for EnvLlmConfig {
    fn api_key(&self) -> &str {
        &self.api_key
    }
    fn base_url(&self) -> &str {
        &self.base_url
    }
    fn model(&self) -> &str {
        &self.llm_model
    }
    fn temperature(&self) -> f32 {
        self.llm_temperature
    }
    fn system_prompt(&self) -> Option<&str> {
        self.llm_system_prompt.as_deref()
    }
}

impl EnvLlmConfig {
    /// Load from environment variables: `MISTRAL_API_KEY` (or `OPENAI_API_KEY`), `OPENAI_BASE_URL`,
    /// `LLM_MODEL`, `LLM_TEMPERATURE`, `LLM_SYSTEM_PROMPT`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("MISTRAL_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .context("MISTRAL_API_KEY or OPENAI_API_KEY not set")?;
        let base_url = env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let llm_model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string());
        let llm_temperature = match env::var("LLM_TEMPERATURE") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("LLM_TEMPERATURE is not a number: {raw}"))?,
            Err(_) => DEFAULT_TEMPERATURE,
        };
        let llm_system_prompt = env::var("LLM_SYSTEM_PROMPT")
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            api_key,
            base_url,
            llm_model,
            llm_temperature,
            llm_system_prompt,
        })
    }
}
