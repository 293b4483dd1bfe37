//! Category-bound specialists.
//!
//! A [`SpecialistAgent`] pairs a category with its persona, sampling
//! parameters, and refinement budget, and turns a refinement outcome into
//! an [`AgentResponse`] with a confidence value.

use tracing::info;

use super::config::AgentConfig;
use super::interrupt::Interrupt;
use super::provider::LlmProvider;
use super::refinement::{RefinementLoop, RefinementPolicy, Termination};
use super::response::AgentResponse;
use super::traits::Agent;
use crate::core::{QueryCategory, is_list_line};
use crate::error::{ConsultError, ProviderError};

/// Maximum reasoning highlights kept per answer.
pub const MAX_HIGHLIGHTS: usize = 5;

/// Maps a final score and attempt count to a confidence value.
///
/// `clamp(score / 100 - penalty * (attempts - 1), floor, ceiling)`:
/// monotonically increasing in score, decreasing in attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceModel {
    /// Deducted for every attempt after the first.
    pub attempt_penalty: f64,
    /// Lowest confidence for any produced answer.
    pub floor: f64,
    /// Highest confidence.
    pub ceiling: f64,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self {
            attempt_penalty: 0.1,
            floor: 0.1,
            ceiling: 1.0,
        }
    }
}

impl ConfidenceModel {
    /// Confidence for an answer scoring `score` after `attempts` rounds.
    #[must_use]
    pub fn confidence(&self, score: f64, attempts: usize) -> f64 {
        let extra = u32::try_from(attempts.saturating_sub(1)).unwrap_or(u32::MAX);
        let raw = score / 100.0 - self.attempt_penalty * f64::from(extra);
        raw.clamp(self.floor, self.ceiling)
    }
}

/// Lines starting with a bullet or ordinal, at most [`MAX_HIGHLIGHTS`].
#[must_use]
pub fn reasoning_highlights(answer: &str) -> Vec<String> {
    answer
        .lines()
        .map(str::trim)
        .filter(|line| is_list_line(line))
        .take(MAX_HIGHLIGHTS)
        .map(str::to_string)
        .collect()
}

/// A specialist for one category.
#[derive(Debug, Clone)]
pub struct SpecialistAgent {
    category: QueryCategory,
    model: String,
    temperature: f32,
    max_tokens: u32,
    policy: RefinementPolicy,
    confidence: ConfidenceModel,
    refinement: RefinementLoop,
}

impl SpecialistAgent {
    /// Creates the specialist for `category` from engine configuration.
    #[must_use]
    pub fn new(category: QueryCategory, config: &AgentConfig, refinement: RefinementLoop) -> Self {
        Self {
            category,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            policy: config.refinement_policy(category),
            confidence: ConfidenceModel {
                attempt_penalty: config.attempt_penalty,
                ..ConfidenceModel::default()
            },
            refinement,
        }
    }

    /// The category this specialist answers.
    #[must_use]
    pub const fn category(&self) -> QueryCategory {
        self.category
    }

    /// Refinement budget and threshold.
    #[must_use]
    pub const fn policy(&self) -> RefinementPolicy {
        self.policy
    }

    /// Answers a question, refining until the rubric passes.
    ///
    /// # Errors
    ///
    /// Returns [`ConsultError::TerminalFailure`] if no round produced
    /// text, or [`ConsultError::Cancelled`] if interrupted first.
    pub async fn handle(
        &self,
        provider: &dyn LlmProvider,
        question: &str,
        context: Option<&str>,
        interrupt: &Interrupt,
    ) -> Result<AgentResponse, ConsultError> {
        let composer = self.refinement.composer();
        let initial = composer.compose(self.category, question, context);

        let outcome = self
            .refinement
            .run(
                self,
                provider,
                &initial,
                question,
                self.category,
                self.policy,
                interrupt,
            )
            .await;

        let Some(best) = outcome.best() else {
            return Err(match outcome.termination {
                Termination::Cancelled => ConsultError::Cancelled {
                    category: self.category,
                },
                _ => ConsultError::TerminalFailure {
                    category: self.category,
                    source: outcome.last_error.clone().unwrap_or_else(|| {
                        ProviderError::Transient {
                            message: "no provider call was made".to_string(),
                        }
                    }),
                },
            });
        };

        let attempts_used = outcome.attempts_used();
        let quality_score = best.report.overall_score;
        let confidence = self.confidence.confidence(quality_score, attempts_used);

        info!(
            agent = self.name(),
            quality = quality_score,
            confidence,
            attempts = attempts_used,
            provider_calls = outcome.provider_calls,
            tokens = outcome.tokens_used,
            termination = ?outcome.termination,
            "specialist answered"
        );

        Ok(AgentResponse {
            content: best.content.clone(),
            confidence,
            category: self.category,
            reasoning_highlights: reasoning_highlights(&best.content),
            quality_score,
            attempts_used,
        })
    }
}

impl Agent for SpecialistAgent {
    fn name(&self) -> &'static str {
        match self.category {
            QueryCategory::Diagnosis => "diagnosis_specialist",
            QueryCategory::Treatment => "treatment_specialist",
            QueryCategory::Prevention => "prevention_specialist",
            QueryCategory::Emergency => "emergency_specialist",
            QueryCategory::Procedure => "procedure_specialist",
            QueryCategory::General => "general_specialist",
        }
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// One specialist per category, indexed by [`QueryCategory::index`].
#[derive(Debug, Clone)]
pub struct SpecialistTable {
    agents: [SpecialistAgent; 6],
}

impl SpecialistTable {
    /// Builds every specialist over a shared refinement loop.
    #[must_use]
    pub fn new(config: &AgentConfig, refinement: &RefinementLoop) -> Self {
        Self {
            agents: QueryCategory::ALL
                .map(|category| SpecialistAgent::new(category, config, refinement.clone())),
        }
    }

    /// The specialist for a category.
    #[must_use]
    pub const fn get(&self, category: QueryCategory) -> &SpecialistAgent {
        &self.agents[category.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct FixedProvider {
        reply: Result<String, ProviderError>,
        calls: AtomicUsize,
    }

    impl FixedProvider {
        fn new(reply: Result<String, ProviderError>) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().map(ChatResponse::text)
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    const EMERGENCY_ANSWER: &str = "This is a dental emergency and needs urgent care.\n\n\
        1. Pain management: take ibuprofen and use a cold compress.\n\
        2. Risk: the infection can spread if left untreated.\n\
        3. Urgent action: call me right now or go to the nearest emergency room.\n\
        4. Follow-up care: I will check the area again after treatment.\n\n\
        Please do not wait.";

    #[test]
    fn test_confidence_formula() {
        let model = ConfidenceModel::default();
        assert!((model.confidence(100.0, 1) - 1.0).abs() < 1e-9);
        assert!((model.confidence(90.0, 2) - 0.8).abs() < 1e-9);
        assert!((model.confidence(0.0, 1) - 0.1).abs() < 1e-9);
        assert!((model.confidence(50.0, 10) - 0.1).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_confidence_monotonic(
            score in 0.0f64..=100.0,
            bump in 0.0f64..=50.0,
            attempts in 1usize..8,
        ) {
            let model = ConfidenceModel::default();
            let base = model.confidence(score, attempts);
            prop_assert!((0.1..=1.0).contains(&base));
            prop_assert!(model.confidence((score + bump).min(100.0), attempts) >= base);
            prop_assert!(model.confidence(score, attempts + 1) <= base);
        }
    }

    #[test]
    fn test_highlights_capped_at_five() {
        let answer = "Intro\n• a\n• b\n1. c\n- d\n* e\n• f\nClosing?";
        let highlights = reasoning_highlights(answer);
        assert_eq!(highlights, vec!["• a", "• b", "1. c", "- d", "* e"]);
    }

    #[test]
    fn test_emergency_policy_is_wider() {
        let config = config();
        let table = SpecialistTable::new(&config, &RefinementLoop::default());
        let emergency = table.get(QueryCategory::Emergency).policy();
        let treatment = table.get(QueryCategory::Treatment).policy();
        assert!(emergency.max_attempts > treatment.max_attempts);
        assert!(emergency.accept_threshold < treatment.accept_threshold);
        assert_eq!(table.get(QueryCategory::Procedure).category(), QueryCategory::Procedure);
    }

    #[tokio::test]
    async fn test_handle_emergency_answer() {
        let provider = FixedProvider::new(Ok(EMERGENCY_ANSWER.to_string()));
        let agent = SpecialistAgent::new(QueryCategory::Emergency, &config(), RefinementLoop::default());
        let response = agent
            .handle(
                &provider,
                "I have severe pain and my face is swollen",
                None,
                &Interrupt::default(),
            )
            .await
            .unwrap_or_else(|_| AgentResponse::fallback());

        assert_eq!(response.category, QueryCategory::Emergency);
        assert_eq!(response.attempts_used, 1);
        assert!(response.confidence > 0.0);
        assert_eq!(response.reasoning_highlights.len(), 4);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handle_terminal_failure() {
        let provider = FixedProvider::new(Err(ProviderError::InvalidRequest {
            message: "malformed".to_string(),
        }));
        let agent = SpecialistAgent::new(QueryCategory::Treatment, &config(), RefinementLoop::default());
        let result = agent
            .handle(&provider, "Do you do crowns?", None, &Interrupt::default())
            .await;

        assert!(matches!(
            result,
            Err(ConsultError::TerminalFailure {
                category: QueryCategory::Treatment,
                source: ProviderError::InvalidRequest { .. }
            })
        ));
    }

    #[tokio::test]
    async fn test_handle_cancelled_without_answer() {
        let token = CancellationToken::new();
        token.cancel();
        let provider = FixedProvider::new(Ok("unused".to_string()));
        let agent = SpecialistAgent::new(QueryCategory::General, &config(), RefinementLoop::default());
        let result = agent
            .handle(&provider, "Hi", None, &Interrupt::new(token, None))
            .await;

        assert_eq!(
            result,
            Err(ConsultError::Cancelled {
                category: QueryCategory::General
            })
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_exhausted_weak_answers_still_answer() {
        let provider = FixedProvider::new(Ok("Cavities.".to_string()));
        let agent = SpecialistAgent::new(QueryCategory::Diagnosis, &config(), RefinementLoop::default());
        let response = agent
            .handle(&provider, "Why do my teeth hurt?", None, &Interrupt::default())
            .await
            .unwrap_or_else(|_| AgentResponse::fallback());

        assert_eq!(response.attempts_used, 3);
        assert_eq!(response.category, QueryCategory::Diagnosis);
        assert!(response.confidence >= 0.1);
        assert!(response.quality_score < 80.0);
    }
}
