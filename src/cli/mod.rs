//! CLI layer for consult-rs.
//!
//! Provides the command-line interface using clap, with commands for
//! classifying questions, scoring answers, inspecting prompts, and
//! running consultations.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands};
