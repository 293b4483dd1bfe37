//! Pluggable completion provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls, and classify every failure as a
//! [`ProviderError`] so the refinement loop can decide whether to retry.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::ProviderError;

/// Trait for completion provider backends.
///
/// A provider is stateless across calls and shared by every specialist
/// in a consultation, including concurrent consensus runs.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transient`] or [`ProviderError::RateLimited`]
    /// when the same request may succeed later, and
    /// [`ProviderError::InvalidRequest`] when it never will.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError>;
}
