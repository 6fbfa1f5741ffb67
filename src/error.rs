//! Error types for the execution core

use std::time::Duration;

use thiserror::Error;

use crate::types::result::ExecutionResult;

/// Main error type for the execution core
#[derive(Error, Debug)]
pub enum VintnerError {
    /// Credential never validated within the retry budget, or the user
    /// cancelled secret collection
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Non-interactive command exceeded its wall-clock bound
    ///
    /// Carries everything captured before the deadline; partial output is
    /// never discarded.
    #[error("Command timed out after {elapsed:?}")]
    Timeout {
        /// Time spent before the bound was hit
        elapsed: Duration,
        /// Output captured up to the point of termination
        partial: Box<ExecutionResult>,
    },

    /// Interactive command cancelled with abort-now semantics
    ///
    /// Carries everything captured before termination.
    #[error("Command cancelled while running")]
    Cancelled {
        /// Output captured up to the point of termination
        partial: Box<ExecutionResult>,
    },

    /// Executable missing or unrunnable
    #[error("Failed to spawn process: {0}")]
    ProcessSpawn(String),

    /// Human-interaction collaborator failed or went away mid-exchange
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for execution core operations
pub type Result<T> = std::result::Result<T, VintnerError>;

impl VintnerError {
    /// Create an authentication error
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a timeout error carrying partial output
    #[must_use]
    pub fn timeout(elapsed: Duration, partial: ExecutionResult) -> Self {
        Self::Timeout {
            elapsed,
            partial: Box::new(partial),
        }
    }

    /// Create a cancellation error carrying partial output
    #[must_use]
    pub fn cancelled(partial: ExecutionResult) -> Self {
        Self::Cancelled {
            partial: Box::new(partial),
        }
    }

    /// Create a process spawn error
    pub fn spawn(msg: impl Into<String>) -> Self {
        Self::ProcessSpawn(msg.into())
    }

    /// Create a collaborator error
    pub fn collaborator(msg: impl Into<String>) -> Self {
        Self::Collaborator(msg.into())
    }

    /// Partial output attached to `Timeout` and `Cancelled` errors
    #[must_use]
    pub fn partial_result(&self) -> Option<&ExecutionResult> {
        match self {
            Self::Timeout { partial, .. } | Self::Cancelled { partial } => Some(partial),
            _ => None,
        }
    }
}
