//! Orchestrator for routed consultations.
//!
//! Coordinates the full pipeline: validate → retrieve context → classify
//! → route to a specialist → (optionally) arbitrate against the general
//! specialist → hand the result to interaction sinks.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::AgentConfig;
use super::interrupt::Interrupt;
use super::provider::LlmProvider;
use super::refinement::RefinementLoop;
use super::response::AgentResponse;
use super::retrieval::{NoRetrieval, RetrievedContext, Retriever};
use super::sink::{ConsultMode, InteractionRecord, InteractionSink, TracingSink};
use super::specialist::{SpecialistAgent, SpecialistTable};
use crate::core::{
    ClassificationResult, IntentClassifier, PersonaSet, PromptComposer, QualityScorer,
    QueryCategory,
};
use crate::error::ConsultError;

/// Longest accepted question, in bytes.
pub const MAX_QUESTION_LEN: usize = 10_000;

/// Routes questions to specialists and returns their answers.
///
/// Personas, keyword tables, and rubrics are built once and only read
/// afterwards, so one orchestrator can serve concurrent consultations.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    retriever: Arc<dyn Retriever>,
    sinks: Vec<Arc<dyn InteractionSink>>,
    classifier: IntentClassifier,
    specialists: SpecialistTable,
    config: AgentConfig,
}

impl Orchestrator {
    /// Creates an orchestrator with the given provider and configuration.
    ///
    /// Loads persona overrides from [`AgentConfig::prompt_dir`], falling
    /// back to compiled-in defaults. Starts with no retrieval and a
    /// [`TracingSink`].
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let personas = PersonaSet::load(config.prompt_dir.as_deref());
        let refinement = RefinementLoop::new(PromptComposer::new(personas), QualityScorer::new());
        Self {
            provider,
            retriever: Arc::new(NoRetrieval),
            sinks: vec![Arc::new(TracingSink)],
            classifier: IntentClassifier::new(),
            specialists: SpecialistTable::new(&config, &refinement),
            config,
        }
    }

    /// Replaces the personas used by every specialist.
    #[must_use]
    pub fn with_personas(mut self, personas: PersonaSet) -> Self {
        let refinement = RefinementLoop::new(PromptComposer::new(personas), QualityScorer::new());
        self.specialists = SpecialistTable::new(&self.config, &refinement);
        self
    }

    /// Replaces the retrieval collaborator.
    #[must_use]
    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = retriever;
        self
    }

    /// Adds an interaction sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replaces the intent classifier.
    #[must_use]
    pub fn with_classifier(mut self, classifier: IntentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Classifies a question without consulting anyone.
    #[must_use]
    pub fn classify(&self, question: &str) -> ClassificationResult {
        self.classifier.classify_detailed(question)
    }

    /// Answers a question with the routed specialist.
    ///
    /// # Errors
    ///
    /// Returns [`ConsultError`] on invalid input, or when the specialist
    /// produced no answer before failing or timing out.
    pub async fn consult(&self, question: &str) -> Result<AgentResponse, ConsultError> {
        self.consult_with(question, &CancellationToken::new()).await
    }

    /// Like [`consult`](Self::consult), cancellable through `token`.
    ///
    /// # Errors
    ///
    /// See [`consult`](Self::consult).
    pub async fn consult_with(
        &self,
        question: &str,
        token: &CancellationToken,
    ) -> Result<AgentResponse, ConsultError> {
        validate_question(question)?;
        let start = Instant::now();
        let interrupt = Interrupt::with_timeout(token.clone(), self.config.timeout);

        let context = self.retrieve(question, &interrupt).await;
        let category = self.route(question, &context);

        let response = self
            .specialists
            .get(category)
            .handle(
                self.provider.as_ref(),
                question,
                context.as_prompt_context(),
                &interrupt,
            )
            .await?;

        self.record(question, &response, ConsultMode::Single, start, &context)
            .await;
        Ok(response)
    }

    /// Answers with the routed specialist and arbitrates against the
    /// general specialist, using the configured agent count.
    ///
    /// # Errors
    ///
    /// See [`consult_with_consensus_using`](Self::consult_with_consensus_using).
    pub async fn consult_with_consensus(
        &self,
        question: &str,
    ) -> Result<AgentResponse, ConsultError> {
        self.consult_with_consensus_using(
            question,
            self.config.consensus_agents,
            &CancellationToken::new(),
        )
        .await
    }

    /// Runs up to two specialists on the same context and keeps the
    /// answer with the higher `quality_score × confidence`.
    ///
    /// The general specialist is the only secondary, so `agent_count`
    /// above two behaves like two. With `agent_count < 2`, or when the
    /// question routes to General, only the routed specialist runs.
    /// Both specialists finish before arbitration.
    ///
    /// # Errors
    ///
    /// Returns [`ConsultError`] on invalid input, or when neither
    /// specialist produced an answer (the routed specialist's error).
    pub async fn consult_with_consensus_using(
        &self,
        question: &str,
        agent_count: usize,
        token: &CancellationToken,
    ) -> Result<AgentResponse, ConsultError> {
        validate_question(question)?;
        let start = Instant::now();
        let interrupt = Interrupt::with_timeout(token.clone(), self.config.timeout);

        let context = self.retrieve(question, &interrupt).await;
        let category = self.route(question, &context);
        let primary = self.specialists.get(category);

        let response = if agent_count < 2 || category == QueryCategory::General {
            self.handle(primary, question, &context, &interrupt).await?
        } else {
            let secondary = self.specialists.get(QueryCategory::General);
            let (first, second) = tokio::join!(
                self.handle(primary, question, &context, &interrupt),
                self.handle(secondary, question, &context, &interrupt),
            );
            select_consensus(first, second)?
        };

        self.record(question, &response, ConsultMode::Consensus, start, &context)
            .await;
        Ok(response)
    }

    /// Consults and maps generation failures to the fallback response.
    ///
    /// # Errors
    ///
    /// Only input validation errors are returned; every other failure
    /// yields [`AgentResponse::fallback`].
    pub async fn consult_or_fallback(
        &self,
        question: &str,
        consensus: bool,
    ) -> Result<AgentResponse, ConsultError> {
        let result = if consensus {
            self.consult_with_consensus(question).await
        } else {
            self.consult(question).await
        };

        match result {
            Ok(response) => Ok(response),
            Err(err @ (ConsultError::EmptyQuestion | ConsultError::QuestionTooLong { .. })) => {
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "consultation failed, returning fallback");
                Ok(AgentResponse::fallback())
            }
        }
    }

    async fn handle(
        &self,
        agent: &SpecialistAgent,
        question: &str,
        context: &RetrievedContext,
        interrupt: &Interrupt,
    ) -> Result<AgentResponse, ConsultError> {
        agent
            .handle(
                self.provider.as_ref(),
                question,
                context.as_prompt_context(),
                interrupt,
            )
            .await
    }

    /// Fetches context; failures and interruptions degrade to empty.
    async fn retrieve(&self, question: &str, interrupt: &Interrupt) -> RetrievedContext {
        match interrupt.race(self.retriever.retrieve_and_rank(question)).await {
            Some(Ok(context)) => context,
            Some(Err(err)) => {
                warn!(retriever = self.retriever.name(), error = %err, "retrieval failed, continuing without context");
                RetrievedContext::empty()
            }
            None => RetrievedContext::empty(),
        }
    }

    fn route(&self, question: &str, context: &RetrievedContext) -> QueryCategory {
        let classification = self.classifier.classify_detailed(question);
        debug!(
            scores = ?classification.scores,
            emergency_preempted = classification.emergency_preempted,
            "classified question"
        );
        info!(
            category = %classification.category,
            context_chunks = context.chunk_count,
            "routing consultation"
        );
        classification.category
    }

    async fn record(
        &self,
        question: &str,
        response: &AgentResponse,
        mode: ConsultMode,
        start: Instant,
        context: &RetrievedContext,
    ) {
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        let record = InteractionRecord::new(
            question,
            response.clone(),
            mode,
            elapsed_ms,
            context.chunk_count,
        );
        for sink in &self.sinks {
            if let Err(err) = sink.record(&record).await {
                warn!(sink = sink.name(), error = %err, "interaction sink failed");
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("retriever", &self.retriever.name())
            .field("sinks", &self.sinks.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Rejects empty and oversized questions before any provider call.
///
/// # Errors
///
/// Returns [`ConsultError::EmptyQuestion`] or [`ConsultError::QuestionTooLong`].
pub fn validate_question(question: &str) -> Result<(), ConsultError> {
    if question.trim().is_empty() {
        return Err(ConsultError::EmptyQuestion);
    }
    if question.len() > MAX_QUESTION_LEN {
        return Err(ConsultError::QuestionTooLong {
            len: question.len(),
            max: MAX_QUESTION_LEN,
        });
    }
    Ok(())
}

/// Picks between the routed (`primary`) and general (`secondary`) answers.
///
/// The higher `quality_score × confidence` wins and exact ties keep the
/// primary. A failed side loses to a successful one; if both failed, the
/// primary's error is returned.
///
/// # Errors
///
/// Returns the primary's error when neither side produced an answer.
pub fn select_consensus(
    primary: Result<AgentResponse, ConsultError>,
    secondary: Result<AgentResponse, ConsultError>,
) -> Result<AgentResponse, ConsultError> {
    match (primary, secondary) {
        (Ok(primary), Ok(secondary)) => {
            let (p, s) = (primary.weighted_score(), secondary.weighted_score());
            debug!(primary = p, secondary = s, "arbitrating consensus");
            Ok(if s > p { secondary } else { primary })
        }
        (Ok(primary), Err(err)) => {
            warn!(error = %err, "secondary specialist failed");
            Ok(primary)
        }
        (Err(err), Ok(secondary)) => {
            warn!(error = %err, "routed specialist failed, using secondary");
            Ok(secondary)
        }
        (Err(err), Err(_)) => Err(err),
    }
}
