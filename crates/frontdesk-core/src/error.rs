//! Error types for frontdesk

use thiserror::Error;

/// Result type alias using FrontdeskError
pub type Result<T> = std::result::Result<T, FrontdeskError>;

/// Error type alias for convenience
pub type Error = FrontdeskError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const SERVICE_UNAVAILABLE: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for frontdesk
#[derive(Debug, Error)]
pub enum FrontdeskError {
    /// Embedding or chat-completion provider failure (timeout, rate limit,
    /// malformed response). Recoverable by fallback or a user-visible
    /// apology; never crashes the process.
    #[error("Provider error at {stage}: {message}")]
    Provider { stage: &'static str, message: String },

    /// Vector index unreachable. Fatal to the one retrieval call that hit
    /// it, surfaced as a degraded-answer message.
    #[error("Vector index error: {0}")]
    Index(String),

    /// Reranker model not loaded. Silently downgrades ranking quality.
    #[error("Reranker model unavailable: {0}")]
    ModelUnavailable(String),

    /// A dispatched handler failed. Caught at the router, which forces the
    /// turn to done with a generic apology.
    #[error("Handler '{handler}' failed: {message}")]
    HandlerFailure { handler: String, message: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl FrontdeskError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Provider { .. } | Self::Index(_) | Self::ModelUnavailable(_) => {
                exit_codes::SERVICE_UNAVAILABLE
            }
            Self::Config(_) | Self::InvalidInput(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }

    /// Shorthand for a provider failure at a named pipeline stage
    pub fn provider(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Provider {
            stage,
            message: message.into(),
        }
    }

    /// Shorthand for a handler failure
    pub fn handler(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HandlerFailure {
            handler: handler.into(),
            message: message.into(),
        }
    }
}
