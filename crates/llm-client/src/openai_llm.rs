//! OpenAI-compatible [`LlmClient`]: wraps openai-client, optional system message first.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::CompletionOptions;
use prompt::ChatMessage;
use tracing::instrument;

use super::{chat_message_to_openai, LlmClient, LlmConfig, DEFAULT_LLM_MODEL};

/// LlmClient backed by openai-client.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: openai_client::OpenAIClient,
    model: String,
    temperature: Option<f32>,
    system_prompt: Option<String>,
}

impl OpenAILlmClient {
    pub fn new(api_key: String) -> Self {
        Self::from_client(openai_client::OpenAIClient::new(api_key))
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self::from_client(openai_client::OpenAIClient::with_base_url(api_key, base_url))
    }

    fn from_client(client: openai_client::OpenAIClient) -> Self {
        Self {
            client,
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: None,
            system_prompt: None,
        }
    }

    /// Builds a client from an [`LlmConfig`].
    pub fn from_config(config: &dyn LlmConfig) -> Self {
        Self::with_base_url(config.api_key().to_string(), config.base_url().to_string())
            .with_model(config.model().to_string())
            .with_temperature(config.temperature())
            .with_system_prompt_opt(config.system_prompt().map(str::to_string))
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_system_prompt_opt(mut self, prompt: Option<String>) -> Self {
        self.system_prompt = prompt;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Messages sent for `prompt`: optional system message, then the prompt as a user message.
    fn messages_for(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &self.system_prompt {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(prompt));
        messages
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let openai_messages = self
            .messages_for(prompt)
            .iter()
            .map(chat_message_to_openai)
            .collect::<Result<Vec<_>>>()?;
        let options = CompletionOptions {
            temperature: self.temperature,
        };
        let reply = self
            .client
            .chat_completion(&self.model, openai_messages, options)
            .await?;
        Ok(reply.trim().to_string())
    }
}
