//! LLM-backed consultation engine.
//!
//! Routes a question to a persona-conditioned specialist and refines the
//! provider's answer against the quality rubric. Uses a pluggable
//! provider abstraction backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! question → Orchestrator
//!   ├── Retriever (optional context)
//!   ├── IntentClassifier → QueryCategory
//!   ├── SpecialistAgent (routed)            ┐ consensus mode runs both
//!   │   └── RefinementLoop                  │ concurrently and keeps the
//!   │       generate → score → reprompt     │ higher quality × confidence
//!   ├── SpecialistAgent (General)           ┘
//!   └── InteractionSink(s)
//! ```
//!
//! # Feature Gate
//!
//! This module requires the `agent` feature flag (enabled by default):
//! ```toml
//! [dependencies]
//! consult-rs = { version = "...", features = ["agent"] }
//! ```

pub mod client;
pub mod config;
pub mod interrupt;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod providers;
pub mod refinement;
pub mod response;
pub mod retrieval;
pub mod sink;
pub mod specialist;
pub mod traits;

// Re-export key types
pub use client::create_provider;
pub use config::{AgentConfig, AgentConfigBuilder};
pub use interrupt::Interrupt;
pub use message::{ChatRequest, ChatResponse, TokenUsage};
pub use orchestrator::{MAX_QUESTION_LEN, Orchestrator, select_consensus, validate_question};
pub use provider::LlmProvider;
pub use refinement::{
    RefinementAttempt, RefinementLoop, RefinementOutcome, RefinementPolicy, Termination,
};
pub use response::{AgentResponse, FALLBACK_MESSAGE};
pub use retrieval::{NoRetrieval, RetrievedContext, Retriever, StaticContext};
pub use sink::{ConsultMode, InteractionRecord, InteractionSink, JsonlSink, TracingSink};
pub use specialist::{ConfidenceModel, SpecialistAgent, SpecialistTable, reasoning_highlights};
pub use traits::{Agent, Generation};
