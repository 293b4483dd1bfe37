//! Generate → score → reprompt loop.
//!
//! Rounds are strictly sequential: round *k+1* is composed from the
//! initial prompt plus round *k*'s answer and defects. The loop stops as
//! soon as an answer meets the acceptance threshold, and otherwise
//! returns the best-scoring attempt it has seen.
//!
//! The hard cap is `max_attempts` provider calls. A transient or
//! rate-limited failure spends a call but adds no history and re-enters
//! the same round. An invalid-request failure ends the loop at once.
//! A cancelled round spends nothing.

use serde::Serialize;
use tracing::{debug, warn};

use super::interrupt::Interrupt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{Prompt, PromptComposer, QualityReport, QualityScorer, QueryCategory};
use crate::error::ProviderError;

/// Budget and acceptance bar for one loop invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementPolicy {
    /// Maximum provider calls.
    pub max_attempts: u32,
    /// Score at or above which an answer is accepted.
    pub accept_threshold: f64,
}

/// One answered round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefinementAttempt {
    /// 1-based round index.
    pub round: u32,
    /// Generated text.
    pub content: String,
    /// Score and defects for this text.
    pub report: QualityReport,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// An answer met the threshold.
    Accepted,
    /// The call budget ran out on a scored answer.
    Exhausted,
    /// The interrupt fired.
    Cancelled,
    /// The last provider call failed.
    ProviderFailed,
}

/// Everything one loop invocation produced.
#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    /// Answered rounds, in order.
    pub history: Vec<RefinementAttempt>,
    /// Terminal state.
    pub termination: Termination,
    /// Provider calls made, including failed ones.
    pub provider_calls: u32,
    /// Most recent provider failure, if any.
    pub last_error: Option<ProviderError>,
    /// Total tokens reported across answered rounds.
    pub tokens_used: u32,
}

impl RefinementOutcome {
    /// Highest-scoring attempt; the earliest wins ties.
    #[must_use]
    pub fn best(&self) -> Option<&RefinementAttempt> {
        self.history.iter().fold(None, |best, attempt| match best {
            Some(b) if b.report.overall_score >= attempt.report.overall_score => Some(b),
            _ => Some(attempt),
        })
    }

    /// Number of rounds that produced text.
    #[must_use]
    pub fn attempts_used(&self) -> usize {
        self.history.len()
    }
}

/// Drives an agent through scored refinement rounds.
#[derive(Debug, Clone, Default)]
pub struct RefinementLoop {
    composer: PromptComposer,
    scorer: QualityScorer,
}

impl RefinementLoop {
    /// Creates a loop over a composer and scorer.
    #[must_use]
    pub const fn new(composer: PromptComposer, scorer: QualityScorer) -> Self {
        Self { composer, scorer }
    }

    /// The composer used for reprompts.
    #[must_use]
    pub const fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// The scorer applied to every answer.
    #[must_use]
    pub const fn scorer(&self) -> &QualityScorer {
        &self.scorer
    }

    /// Runs the loop from `initial` until acceptance, exhaustion,
    /// cancellation, or a non-retryable provider failure.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        agent: &dyn Agent,
        provider: &dyn LlmProvider,
        initial: &Prompt,
        question: &str,
        category: QueryCategory,
        policy: RefinementPolicy,
        interrupt: &Interrupt,
    ) -> RefinementOutcome {
        let mut history: Vec<RefinementAttempt> = Vec::new();
        let mut provider_calls = 0u32;
        let mut last_error = None;
        let mut last_call_failed = false;
        let mut tokens_used = 0u32;
        let mut prompt = initial.clone();

        let termination = loop {
            if provider_calls >= policy.max_attempts {
                break if last_call_failed {
                    Termination::ProviderFailed
                } else {
                    Termination::Exhausted
                };
            }
            if interrupt.is_triggered() {
                break Termination::Cancelled;
            }

            let round = u32::try_from(history.len()).unwrap_or(u32::MAX).saturating_add(1);
            let Some(result) = interrupt.race(agent.generate(provider, &prompt)).await else {
                debug!(agent = agent.name(), round, "round cancelled");
                break Termination::Cancelled;
            };
            provider_calls += 1;

            let generation = match result {
                Ok(generation) => generation,
                Err(err) => {
                    warn!(
                        agent = agent.name(),
                        round,
                        call = provider_calls,
                        kind = err.kind(),
                        error = %err,
                        "provider call failed"
                    );
                    let retryable = err.is_retryable();
                    last_error = Some(err);
                    last_call_failed = true;
                    if retryable {
                        continue;
                    }
                    break Termination::ProviderFailed;
                }
            };
            last_call_failed = false;
            tokens_used = tokens_used.saturating_add(generation.usage.total_tokens);

            let report = self.scorer.score(&generation.content, category, question);
            let accepted = report.meets(policy.accept_threshold);
            debug!(
                agent = agent.name(),
                round,
                score = report.overall_score,
                defects = report.defects.len(),
                tokens = generation.usage.total_tokens,
                finish_reason = generation.finish_reason.as_deref().unwrap_or("unknown"),
                accepted,
                "scored round"
            );

            prompt = self
                .composer
                .compose_reprompt(initial, &generation.content, &report.defects);
            history.push(RefinementAttempt {
                round,
                content: generation.content,
                report,
            });

            if accepted {
                break Termination::Accepted;
            }
        };

        RefinementOutcome {
            history,
            termination,
            provider_calls,
            last_error,
            tokens_used,
        }
    }
}
