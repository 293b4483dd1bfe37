//! Deterministic core: classification, personas, prompt composition, and
//! quality scoring.
//!
//! Nothing here performs I/O beyond loading persona overrides, and every
//! public function is total over its inputs.

pub mod category;
pub mod classifier;
pub mod persona;
pub mod prompt;
pub mod quality;

pub use category::QueryCategory;
pub use classifier::{CategoryScore, ClassificationResult, IntentClassifier, KeywordTable};
pub use persona::{PersonaSet, SpecialistPersona};
pub use prompt::{Prompt, PromptComposer};
pub use quality::{CategoryRubric, DefectKind, QualityReport, QualityScorer, Section, is_list_line};
