//! Error types for the CLI

use locus::LocusError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Exit code for a wait that did not succeed
pub const EXIT_WAIT_FAILED: u8 = 2;

/// Exit code for every other failure
pub const EXIT_FAILURE: u8 = 1;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid request, fixture or argument
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Input file could not be read
    #[error("Cannot read {path}: {source}")]
    Read {
        /// Offending path
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The wait timed out or was cancelled
    #[error("Wait failed: {message}")]
    WaitFailed {
        /// Error message
        message: String,
    },

    /// I/O error writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Locus library error
    #[error("{0}")]
    Locus(#[from] LocusError),
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a wait failure
    #[must_use]
    pub fn wait_failed(message: impl Into<String>) -> Self {
        Self::WaitFailed {
            message: message.into(),
        }
    }

    /// Process exit code: 2 for waits that ran out of time, 1 otherwise
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::WaitFailed { .. }
            | Self::Locus(LocusError::Timeout { .. } | LocusError::Cancelled { .. }) => {
                EXIT_WAIT_FAILED
            }
            _ => EXIT_FAILURE,
        }
    }
}
