#![cfg(feature = "agent")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use consult_rs::agent::{
    AgentConfig, AgentResponse, ChatRequest, ChatResponse, JsonlSink, LlmProvider, Orchestrator,
    StaticContext, select_consensus,
};
use consult_rs::{ConsultError, PersonaSet, ProviderError, QueryCategory};
use tokio_util::sync::CancellationToken;

type Reply = dyn Fn(&str, u32) -> Result<String, ProviderError> + Send + Sync;

/// Answers from a closure over (prompt, call number) and records prompts.
struct FakeProvider {
    reply: Box<Reply>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicU32,
}

impl FakeProvider {
    fn new(
        reply: impl Fn(&str, u32) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            reply: Box::new(reply),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        })
    }

    fn always(text: &'static str) -> Arc<Self> {
        Self::new(move |_, _| Ok(text.to_string()))
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let prompt = request.prompt.clone();
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }
        (self.reply)(&prompt, call).map(ChatResponse::text)
    }
}

const EMERGENCY_QUESTION: &str = "I have severe pain and my face is swollen";

const EMERGENCY_ANSWER: &str = "This is a dental emergency and needs urgent care.\n\n\
    1. Pain management: take ibuprofen and use a cold compress.\n\
    2. Risk: the infection can spread if left untreated.\n\
    3. Urgent action: call me right now or go to the nearest emergency room.\n\
    4. Follow-up care: I will check the area again after treatment.\n\n\
    Please do not wait.";

const TREATMENT_QUESTION: &str = "What are my options to fix a cracked tooth?";

const GOOD_TREATMENT: &str = "Yes, I do offer crowns for that. A crown protects a weakened tooth for years. \
                              Would you like to schedule a consultation?";

const WEAK_ANSWER: &str = "Teeth can crack.";

const OFF_TOPIC_ANSWER: &str = "Please brush twice daily.";

fn config() -> AgentConfig {
    AgentConfig::builder()
        .api_key("test-key")
        .build()
        .unwrap_or_else(|_| unreachable!())
}

fn orchestrator(provider: Arc<FakeProvider>) -> Orchestrator {
    Orchestrator::new(provider, config()).with_personas(PersonaSet::defaults())
}

fn response(category: QueryCategory, quality_score: f64, confidence: f64) -> AgentResponse {
    AgentResponse {
        content: format!("{category} answer"),
        confidence,
        category,
        reasoning_highlights: Vec::new(),
        quality_score,
        attempts_used: 1,
    }
}

#[tokio::test]
async fn test_emergency_question_routes_to_emergency_specialist() {
    let provider = FakeProvider::always(EMERGENCY_ANSWER);
    let response = orchestrator(provider.clone())
        .consult(EMERGENCY_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(response.category, QueryCategory::Emergency);
    assert_eq!(response.attempts_used, 1);
    assert!((response.quality_score - 100.0).abs() < f64::EPSILON);
    assert_eq!(response.reasoning_highlights.len(), 4);
    assert_eq!(provider.calls(), 1);

    let prompts = provider.prompts();
    assert!(prompts[0].contains("EMERGENCY ASSESSMENT PROTOCOL"));
    assert!(prompts[0].ends_with("Now provide your well-formatted response:"));
}

#[tokio::test]
async fn test_empty_answer_is_reprompted_with_feedback() {
    let provider = FakeProvider::new(|_, call| {
        Ok(if call == 1 {
            String::new()
        } else {
            GOOD_TREATMENT.to_string()
        })
    });
    let response = orchestrator(provider.clone())
        .consult(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(response.category, QueryCategory::Treatment);
    assert_eq!(response.content, GOOD_TREATMENT);
    assert_eq!(response.attempts_used, 2);
    assert!(response.confidence < response.quality_score / 100.0);

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].starts_with(&prompts[0]));
    assert!(prompts[1].contains("<previous_response>"));
    assert!(prompts[1].contains("The previous response was empty."));
    assert!(prompts[1].ends_with("IMPROVED RESPONSE:"));
}

#[tokio::test]
async fn test_weak_answers_stop_at_call_cap() {
    let provider = FakeProvider::always(WEAK_ANSWER);
    let response = orchestrator(provider.clone())
        .consult(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(provider.calls(), 3);
    assert_eq!(response.attempts_used, 3);
    assert_eq!(response.content, WEAK_ANSWER);
    assert!(!response.is_fallback());
}

#[tokio::test]
async fn test_best_attempt_is_returned_after_exhaustion() {
    let medium = "I can fix a cracked tooth with a crown.";
    let provider = FakeProvider::new(move |_, call| {
        Ok(if call == 2 { medium } else { WEAK_ANSWER }.to_string())
    });
    let response = orchestrator(provider.clone())
        .consult(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(provider.calls(), 3);
    assert_eq!(response.content, medium);
}

#[tokio::test]
async fn test_invalid_request_is_terminal() {
    let provider = FakeProvider::new(|_, _| {
        Err(ProviderError::InvalidRequest {
            message: "context length exceeded".to_string(),
        })
    });
    let orchestrator = orchestrator(provider.clone());

    let result = orchestrator.consult(TREATMENT_QUESTION).await;
    assert!(matches!(
        result,
        Err(ConsultError::TerminalFailure {
            category: QueryCategory::Treatment,
            source: ProviderError::InvalidRequest { .. },
        })
    ));
    assert_eq!(provider.calls(), 1);

    let fallback = orchestrator
        .consult_or_fallback(TREATMENT_QUESTION, false)
        .await;
    assert!(fallback.is_ok_and(|r| r.is_fallback()));
}

#[tokio::test]
async fn test_transient_failures_consume_budget() {
    let provider = FakeProvider::new(|_, call| {
        if call < 3 {
            Err(ProviderError::RateLimited {
                message: "slow down".to_string(),
            })
        } else {
            Ok(GOOD_TREATMENT.to_string())
        }
    });
    let response = orchestrator(provider.clone())
        .consult(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(provider.calls(), 3);
    assert_eq!(response.content, GOOD_TREATMENT);
    assert_eq!(response.attempts_used, 1);

    let prompts = provider.prompts();
    assert_eq!(prompts[0], prompts[2]);
}

#[tokio::test]
async fn test_invalid_questions_make_no_calls() {
    let provider = FakeProvider::always(GOOD_TREATMENT);
    let orchestrator = orchestrator(provider.clone());

    assert_eq!(
        orchestrator.consult("   ").await,
        Err(ConsultError::EmptyQuestion)
    );
    assert!(matches!(
        orchestrator.consult_or_fallback(&"a".repeat(10_001), true).await,
        Err(ConsultError::QuestionTooLong { len: 10_001, .. })
    ));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_consensus_prefers_higher_weighted_score() {
    let primary = response(QueryCategory::Treatment, 60.0, 1.0);
    let secondary = response(QueryCategory::General, 45.0, 1.0);

    let chosen = select_consensus(Ok(primary.clone()), Ok(secondary.clone()));
    assert_eq!(chosen, Ok(primary.clone()));

    let chosen = select_consensus(Ok(secondary.clone()), Ok(primary.clone()));
    assert_eq!(chosen, Ok(primary));
}

#[test]
fn test_consensus_weighs_confidence() {
    let primary = response(QueryCategory::Diagnosis, 90.0, 0.4);
    let secondary = response(QueryCategory::General, 70.0, 0.7);
    let chosen = select_consensus(Ok(primary), Ok(secondary.clone()));
    assert_eq!(chosen, Ok(secondary));
}

#[tokio::test]
async fn test_consensus_runs_general_specialist() {
    let provider = FakeProvider::new(|prompt, _| {
        Ok(if prompt.contains("GENERAL CONSULTATION SPECIALIZATION") {
            OFF_TOPIC_ANSWER
        } else {
            GOOD_TREATMENT
        }
        .to_string())
    });
    let response = orchestrator(provider.clone())
        .consult_with_consensus(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());

    assert_eq!(response.category, QueryCategory::Treatment);
    assert_eq!(response.content, GOOD_TREATMENT);
    // One accepted treatment round plus three general rounds.
    assert_eq!(provider.calls(), 4);
}

#[tokio::test]
async fn test_cancelled_before_first_call() {
    let provider = FakeProvider::always(GOOD_TREATMENT);
    let token = CancellationToken::new();
    token.cancel();

    let result = orchestrator(provider.clone())
        .consult_with(TREATMENT_QUESTION, &token)
        .await;
    assert_eq!(
        result,
        Err(ConsultError::Cancelled {
            category: QueryCategory::Treatment
        })
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_context_and_interaction_log() {
    let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
    let log = dir.path().join("consults.jsonl");
    let provider = FakeProvider::always(GOOD_TREATMENT);

    let orchestrator = orchestrator(provider.clone())
        .with_retriever(Arc::new(StaticContext::new(
            "Crowns cover cracked teeth.\n\nBonding fixes small chips.",
        )))
        .with_sink(Arc::new(JsonlSink::new(&log)));

    let response = orchestrator
        .consult(TREATMENT_QUESTION)
        .await
        .unwrap_or_else(|_| AgentResponse::fallback());
    assert_eq!(response.content, GOOD_TREATMENT);
    assert!(provider.prompts()[0].contains("Crowns cover cracked teeth."));

    let written = std::fs::read_to_string(&log).unwrap_or_default();
    let record: serde_json::Value = serde_json::from_str(written.trim()).unwrap_or_default();
    assert_eq!(record["question"], TREATMENT_QUESTION);
    assert_eq!(record["context_chunks"], 2);
    assert_eq!(record["response"]["agent_type"], "treatment");
}
