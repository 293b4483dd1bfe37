//! Error types for consult-rs.
//!
//! Each layer has its own `thiserror` enum. Classification, prompt
//! composition, and quality scoring are total functions and have no
//! error type at all; only generation, configuration, and the CLI can fail.

use thiserror::Error;

use crate::core::QueryCategory;

/// Failure reported by a completion provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport-level or server-side failure; the same request may succeed later.
    #[error("transient provider failure: {message}")]
    Transient {
        /// Provider-supplied detail.
        message: String,
    },

    /// The provider throttled the request.
    #[error("provider rate limit: {message}")]
    RateLimited {
        /// Provider-supplied detail.
        message: String,
    },

    /// The provider rejected the request itself; resending it cannot succeed.
    #[error("invalid provider request: {message}")]
    InvalidRequest {
        /// Provider-supplied detail.
        message: String,
    },
}

impl ProviderError {
    /// Returns `true` if re-entering the round budget may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::RateLimited { .. })
    }

    /// Short machine-readable kind, used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Transient { .. } => "transient",
            Self::RateLimited { .. } => "rate_limited",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }
}

/// Setup and collaborator errors for the agent layer.
#[derive(Error, Debug)]
pub enum AgentError {
    /// No API key was configured.
    #[error("API key missing: set OPENAI_API_KEY or CONSULT_API_KEY")]
    ApiKeyMissing,

    /// A configuration value is out of range.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Which value was rejected and why.
        message: String,
    },

    /// Provider name has no implementation.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// The configured provider name.
        name: String,
    },

    /// The retrieval collaborator failed.
    #[error("retrieval failed: {message}")]
    Retrieval {
        /// Failure detail.
        message: String,
    },

    /// An interaction sink could not record.
    #[error("interaction sink failed: {message}")]
    Sink {
        /// Failure detail.
        message: String,
    },
}

/// Errors surfaced by a consultation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsultError {
    /// The question was empty or whitespace.
    #[error("question cannot be empty")]
    EmptyQuestion,

    /// The question exceeds the accepted size.
    #[error("question exceeds maximum length ({len} bytes, max {max})")]
    QuestionTooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum accepted length in bytes.
        max: usize,
    },

    /// Generation failed before any answer was produced.
    #[error("{category} specialist produced no answer: {source}")]
    TerminalFailure {
        /// Category of the specialist that failed.
        category: QueryCategory,
        /// The provider failure that ended the loop.
        #[source]
        source: ProviderError,
    },

    /// Cancelled or past deadline before any answer was produced.
    #[error("{category} specialist cancelled before producing an answer")]
    Cancelled {
        /// Category of the specialist that was interrupted.
        category: QueryCategory,
    },
}

/// CLI command errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command could not run to completion.
    #[error("{0}")]
    ExecutionFailed(String),

    /// An argument value was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),
}

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Agent setup or collaborator error.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Consultation error.
    #[error(transparent)]
    Consult(#[from] ConsultError),

    /// CLI command error.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias using the top-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
