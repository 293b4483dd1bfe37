//! Provider-agnostic message types for LLM communication.
//!
//! These types decouple specialist logic from any specific LLM SDK.

/// A chat completion request (provider-agnostic).
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4o-mini").
    pub model: String,
    /// Prompt text, sent as the single user turn.
    pub prompt: String,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A chat completion response (provider-agnostic).
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    /// Generated text content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Finish reason from the model (e.g., `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    /// Creates a response carrying only text.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_response() {
        let response = ChatResponse::text("answer");
        assert_eq!(response.content, "answer");
        assert_eq!(response.usage, TokenUsage::default());
        assert!(response.finish_reason.is_none());
    }
}
