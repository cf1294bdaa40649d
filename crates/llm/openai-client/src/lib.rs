//! # OpenAI API client
//!
//! Non-streaming chat completion against any OpenAI-compatible endpoint (OpenAI, Mistral, a local
//! proxy), built on [async-openai]. API keys only ever reach the logs through [`mask_token`].

use async_openai::{
    config::OpenAIConfig,
    types::{CreateChatCompletionRequest, CreateChatCompletionRequestArgs},
    Client,
};
use std::sync::Arc;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Masks an API key for logging: first 7 chars, `***`, last 4 chars.
/// Keys of 11 bytes or fewer (or that would split a UTF-8 char) become `***`.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        "***".to_string()
    } else {
        format!("{}***{}", &token[..7], &token[len - 4..])
    }
}

/// Sampling options for one completion request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
}

/// Chat client for one endpoint. Cheap to clone.
#[derive(Clone)]
pub struct OpenAIClient {
    client: Arc<Client<OpenAIConfig>>,
    masked_key: String,
}

impl OpenAIClient {
    /// Client for the default OpenAI base URL.
    pub fn new(api_key: String) -> Self {
        Self::build(api_key, None)
    }

    /// Client for a custom OpenAI-compatible base URL.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self::build(api_key, Some(base_url))
    }

    fn build(api_key: String, base_url: Option<String>) -> Self {
        let masked_key = mask_token(&api_key);
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base_url) = base_url {
            config = config.with_api_base(base_url);
        }
        Self {
            client: Arc::new(Client::with_config(config)),
            masked_key,
        }
    }

    /// Sends one chat completion request and returns the first choice's text.
    ///
    /// A response without choices is an error; a choice without content is an empty string.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        options: CompletionOptions,
    ) -> anyhow::Result<String> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            temperature = ?options.temperature,
            api_key = %self.masked_key,
            "chat_completion request"
        );

        let request = build_request(model, messages, options)?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(json) = serde_json::to_string(&request) {
                tracing::debug!(request_json = %json, "chat_completion request JSON");
            }
        }

        let response = self.client.chat().create(request).await?;
        if let Some(usage) = &response.usage {
            tracing::info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat_completion usage"
            );
        }

        let Some(choice) = response.choices.into_iter().next() else {
            anyhow::bail!("chat completion response has no choices");
        };
        Ok(choice.message.content.unwrap_or_default())
    }
}

fn build_request(
    model: &str,
    messages: Vec<ChatCompletionRequestMessage>,
    options: CompletionOptions,
) -> anyhow::Result<CreateChatCompletionRequest> {
    let mut args = CreateChatCompletionRequestArgs::default();
    args.model(model).messages(messages);
    if let Some(t) = options.temperature {
        args.temperature(t);
    }
    Ok(args.build()?)
}
