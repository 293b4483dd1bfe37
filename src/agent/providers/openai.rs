//! `OpenAI` provider implementation using the `async-openai` crate.
//!
//! Supports any `OpenAI`-compatible API (`OpenAI`, Azure, local proxies)
//! via the base URL override in [`AgentConfig`].

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatRequest, ChatResponse, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::error::ProviderError;

/// `OpenAI`-compatible completion provider.
///
/// Wraps the `async-openai` client for chat completions. Compatible
/// with any API that follows the `OpenAI` chat completions API.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
}

impl OpenAiProvider {
    /// Creates a new provider from agent configuration.
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(ref base_url) = config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        Self {
            client: Client::with_config(openai_config),
        }
    }

    /// Wraps the prompt as the request's only (user) message.
    fn user_message(prompt: &str) -> ChatCompletionRequestMessage {
        ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
            content: ChatCompletionRequestUserMessageContent::Text(prompt.to_string()),
            name: None,
        })
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    fn build_request(request: &ChatRequest) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages: vec![Self::user_message(&request.prompt)],
            temperature: request.temperature,
            max_completion_tokens: request.max_tokens,
            ..Default::default()
        }
    }
}

/// Maps an SDK error onto the retry taxonomy.
fn classify_error(error: &OpenAIError) -> ProviderError {
    match error {
        OpenAIError::ApiError(api) => classify_api_error(api.r#type.as_deref(), &api.message),
        OpenAIError::InvalidArgument(message) => ProviderError::InvalidRequest {
            message: message.clone(),
        },
        other => ProviderError::Transient {
            message: other.to_string(),
        },
    }
}

/// Maps an API error body (type and message) onto the retry taxonomy.
fn classify_api_error(kind: Option<&str>, message: &str) -> ProviderError {
    let message = message.to_string();
    let lowered = message.to_lowercase();
    match kind {
        Some("invalid_request_error") => ProviderError::InvalidRequest { message },
        Some("insufficient_quota" | "rate_limit_exceeded" | "requests" | "tokens") => {
            ProviderError::RateLimited { message }
        }
        _ if lowered.contains("rate limit") => ProviderError::RateLimited { message },
        _ => ProviderError::Transient { message },
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let openai_request = Self::build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(|e| classify_error(&e))?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            content,
            usage,
            finish_reason,
        })
    }
}
