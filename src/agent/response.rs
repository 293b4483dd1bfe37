//! The answer handed back to callers.

use serde::Serialize;

use crate::core::QueryCategory;

/// Text returned when no specialist could produce an answer.
pub const FALLBACK_MESSAGE: &str = "I apologize, but I'm having difficulty processing your question right now. \
     Please try again or consider scheduling an in-person consultation.";

/// Final answer from a specialist, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResponse {
    /// Final answer text.
    pub content: String,
    /// Confidence in `0.0..=1.0`; zero only for the fallback.
    pub confidence: f64,
    /// Category of the specialist that answered.
    #[serde(rename = "agent_type")]
    pub category: QueryCategory,
    /// Up to five list lines lifted from the answer, for observability.
    pub reasoning_highlights: Vec<String>,
    /// Quality score of the returned answer.
    pub quality_score: f64,
    /// Rounds that produced text.
    pub attempts_used: usize,
}

impl AgentResponse {
    /// The fixed apology response: confidence 0, category General.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            content: FALLBACK_MESSAGE.to_string(),
            confidence: 0.0,
            category: QueryCategory::General,
            reasoning_highlights: Vec::new(),
            quality_score: 0.0,
            attempts_used: 0,
        }
    }

    /// Whether this is the fallback response.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.confidence <= 0.0 && self.content == FALLBACK_MESSAGE
    }

    /// `quality_score × confidence`, the consensus arbitration key.
    #[must_use]
    pub fn weighted_score(&self) -> f64 {
        self.quality_score * self.confidence
    }
}
