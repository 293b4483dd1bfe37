//! Interaction logging collaborators.
//!
//! Sinks are write-only: the orchestrator hands every finished
//! consultation to each sink and logs, but never surfaces, sink errors.
//! Sinks run inside the async consultation, so blocking I/O belongs on
//! the blocking pool.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::response::AgentResponse;
use crate::error::AgentError;

/// How a consultation was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultMode {
    /// One routed specialist.
    Single,
    /// Routed specialist arbitrated against the general specialist.
    Consensus,
}

/// One finished consultation.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionRecord {
    /// The question as asked.
    pub question: String,
    /// The answer returned to the caller.
    pub response: AgentResponse,
    /// Single or consensus.
    pub mode: ConsultMode,
    /// Wall-clock time for the whole consultation.
    pub elapsed_ms: u64,
    /// Context chunks retrieved for the question.
    pub context_chunks: usize,
    /// Seconds since the Unix epoch when the record was built.
    pub timestamp: u64,
}

impl InteractionRecord {
    /// Builds a record stamped with the current time.
    #[must_use]
    pub fn new(
        question: &str,
        response: AgentResponse,
        mode: ConsultMode,
        elapsed_ms: u64,
        context_chunks: usize,
    ) -> Self {
        Self {
            question: question.to_string(),
            response,
            mode,
            elapsed_ms,
            context_chunks,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        }
    }
}

/// Receives finished consultations.
#[async_trait]
pub trait InteractionSink: Send + Sync {
    /// Sink name for logging.
    fn name(&self) -> &'static str;

    /// Records one consultation.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Sink`] if the record could not be stored.
    async fn record(&self, record: &InteractionRecord) -> Result<(), AgentError>;
}

/// Emits each record as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

#[async_trait]
impl InteractionSink for TracingSink {
    fn name(&self) -> &'static str {
        "tracing"
    }

    async fn record(&self, record: &InteractionRecord) -> Result<(), AgentError> {
        info!(
            agent = %record.response.category,
            quality = record.response.quality_score,
            confidence = record.response.confidence,
            attempts = record.response.attempts_used,
            context_chunks = record.context_chunks,
            elapsed_ms = record.elapsed_ms,
            mode = ?record.mode,
            "consultation complete"
        );
        Ok(())
    }
}

/// Appends one JSON object per line to a file.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    /// Creates a sink appending to `path`; the file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The target file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InteractionSink for JsonlSink {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    async fn record(&self, record: &InteractionRecord) -> Result<(), AgentError> {
        let sink_error = |message: String| AgentError::Sink { message };

        let mut line = serde_json::to_string(record).map_err(|e| sink_error(e.to_string()))?;
        line.push('\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| sink_error(format!("write task failed: {e}")))?
            .map_err(|e| sink_error(format!("{}: {e}", self.path.display())))
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?
        .write_all(line.as_bytes())
}
