//! Result and error types for Locus.

use thiserror::Error;

/// Result type for Locus operations
pub type LocusResult<T> = Result<T, LocusError>;

/// Errors that can occur in Locus
#[derive(Debug, Error)]
pub enum LocusError {
    /// The request is malformed and the caller must fix it
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Deadline elapsed before the condition held
    #[error("Operation timed out after {ms}ms: {waited_for}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// What was being waited for
        waited_for: String,
    },

    /// Wait aborted through its cancel token
    #[error("Wait cancelled after {after_ms}ms")]
    Cancelled {
        /// Elapsed time when the cancellation was observed
        after_ms: u64,
    },

    /// Host collaborator failure outside of a poll loop
    #[error("Host error: {message}")]
    Host {
        /// Error message
        message: String,
    },

    /// A probe script returned something the engine cannot interpret
    #[error("Script result error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML document
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl LocusError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a longer timeout could make the same request succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Host { .. })
    }
}
