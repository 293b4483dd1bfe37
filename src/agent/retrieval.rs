//! Knowledge-base retrieval collaborator.
//!
//! The orchestrator asks a [`Retriever`] for context before routing. Empty
//! context is valid and simply omits the context block from the prompt.

use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AgentError;

/// Ranked context for one question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetrievedContext {
    /// Concatenated context text.
    pub text: String,
    /// Number of chunks that contributed to `text`.
    pub chunk_count: usize,
}

impl RetrievedContext {
    /// Context with no chunks.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds context from text, counting blank-line-separated chunks.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let chunk_count = text
            .split("\n\n")
            .filter(|chunk| !chunk.trim().is_empty())
            .count();
        Self { text, chunk_count }
    }

    /// Whether there is no usable text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The text, or `None` when empty.
    #[must_use]
    pub fn as_prompt_context(&self) -> Option<&str> {
        (!self.is_empty()).then_some(self.text.as_str())
    }
}

/// Source of ranked context for a question.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retriever name for logging.
    fn name(&self) -> &'static str;

    /// Retrieves and ranks context for `question`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Retrieval`] when the backing store fails.
    async fn retrieve_and_rank(&self, question: &str) -> Result<RetrievedContext, AgentError>;
}

/// Retriever that never returns context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetrieval;

#[async_trait]
impl Retriever for NoRetrieval {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn retrieve_and_rank(&self, _question: &str) -> Result<RetrievedContext, AgentError> {
        Ok(RetrievedContext::empty())
    }
}

/// Retriever that serves the same context for every question.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    context: RetrievedContext,
}

impl StaticContext {
    /// Serves `text` for every question.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            context: RetrievedContext::from_text(text),
        }
    }

    /// Loads the served context from a file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }
}

#[async_trait]
impl Retriever for StaticContext {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn retrieve_and_rank(&self, _question: &str) -> Result<RetrievedContext, AgentError> {
        Ok(self.context.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_text_counts_chunks() {
        let context = RetrievedContext::from_text("First chunk.\n\nSecond chunk.\n\n\n\nThird.");
        assert_eq!(context.chunk_count, 3);
        assert_eq!(context.as_prompt_context(), Some(context.text.as_str()));
    }

    #[test]
    fn test_blank_context_is_empty() {
        let context = RetrievedContext::from_text("  \n\n ");
        assert!(context.is_empty());
        assert_eq!(context.chunk_count, 0);
        assert_eq!(context.as_prompt_context(), None);
    }

    #[tokio::test]
    async fn test_no_retrieval() {
        let context = NoRetrieval.retrieve_and_rank("anything").await;
        assert!(context.is_ok_and(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_static_context_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap_or_else(|_| unreachable!());
        writeln!(file, "Abscesses need drainage.").unwrap_or_else(|_| unreachable!());

        let retriever = StaticContext::from_file(file.path()).unwrap_or_else(|_| unreachable!());
        let context = retriever
            .retrieve_and_rank("swelling")
            .await
            .unwrap_or_default();
        assert_eq!(context.chunk_count, 1);
        assert!(context.text.contains("Abscesses"));
    }
}
