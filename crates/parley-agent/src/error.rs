//! Agent error types.

use parley_providers::ProviderError;
use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Caller input was rejected before any state changed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No completion provider is available.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// The completion call failed.
    #[error(transparent)]
    Upstream(#[from] ProviderError),
}

impl AgentError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if this error is retriable.
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Upstream(e) => e.is_retryable(),
            _ => false,
        }
    }
}
