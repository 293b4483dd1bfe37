//! Agent trait definition.
//!
//! Every specialist implements this trait, which fixes its sampling
//! parameters and turns a composed [`Prompt`] into one provider call.

use async_trait::async_trait;

use super::message::{ChatRequest, TokenUsage};
use super::provider::LlmProvider;
use crate::core::Prompt;
use crate::error::ProviderError;

/// Text produced by one provider call.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// The generated text.
    pub content: String,
    /// Token usage for this call.
    pub usage: TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Trait implemented by all agents in the system.
///
/// The prompt already carries persona and formatting rules, so it is
/// sent as a single user message with no separate system prompt.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model identifier to use for this agent.
    fn model(&self) -> &str;

    /// Sampling temperature.
    fn temperature(&self) -> f32 {
        0.7
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        1500
    }

    /// Sends one prompt to the provider.
    ///
    /// # Errors
    ///
    /// Propagates the provider's [`ProviderError`] unchanged.
    async fn generate(
        &self,
        provider: &dyn LlmProvider,
        prompt: &Prompt,
    ) -> Result<Generation, ProviderError> {
        let request = ChatRequest {
            model: self.model().to_string(),
            prompt: prompt.as_str().to_string(),
            temperature: Some(self.temperature()),
            max_tokens: Some(self.max_tokens()),
        };

        let response = provider.chat(&request).await?;

        Ok(Generation {
            content: response.content,
            usage: response.usage,
            finish_reason: response.finish_reason,
        })
    }
}
