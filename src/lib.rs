//! # consult-rs
//!
//! Specialist-routed consultation engine. A free-text question is
//! classified into one of six categories, handed to a persona-conditioned
//! specialist, and answered by a completion provider. Every candidate
//! answer is scored against a per-category rubric and regenerated with
//! itemized feedback until it passes or the attempt budget runs out.
//!
//! ## Layout
//!
//! - [`core`]: pure, deterministic pieces (classifier, personas, prompt
//!   composer, quality scorer)
//! - `agent`: provider abstraction, refinement loop, specialists, and
//!   orchestrator (requires the `agent` feature)
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```
//! use consult_rs::core::{IntentClassifier, QualityScorer, QueryCategory};
//!
//! let category = IntentClassifier::new().classify("How can I prevent cavities?");
//! assert_eq!(category, QueryCategory::Prevention);
//!
//! let report = QualityScorer::new().score("", category, "How can I prevent cavities?");
//! assert!(report.overall_score.abs() < f64::EPSILON);
//! ```

pub mod cli;
pub mod core;
pub mod error;

#[cfg(feature = "agent")]
pub mod agent;

pub use crate::core::{
    DefectKind, IntentClassifier, PersonaSet, Prompt, PromptComposer, QualityReport,
    QualityScorer, QueryCategory,
};
pub use error::{AgentError, CommandError, ConsultError, Error, ProviderError, Result};

#[cfg(feature = "agent")]
pub use agent::{AgentConfig, AgentResponse, Orchestrator};
