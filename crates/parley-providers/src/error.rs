//! Error types for completion providers.

use std::time::Duration;
use thiserror::Error;

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider error types.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider answered with a non-success status.
    #[error("Upstream rejected the request: {status} - {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No response within the deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The response did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error (missing API key, bad client settings).
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification surfaced to callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamKind {
    Rejected,
    Network,
    Timeout,
    Malformed,
    Config,
}

impl UpstreamKind {
    /// Stable name used in logs and error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rejected => "upstream_rejected",
            Self::Network => "network_unreachable",
            Self::Timeout => "timeout",
            Self::Malformed => "malformed_response",
            Self::Config => "configuration",
        }
    }
}

impl ProviderError {
    /// Create a rejection error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Classify a transport error from the HTTP client.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Network(err)
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> UpstreamKind {
        match self {
            Self::Rejected { .. } => UpstreamKind::Rejected,
            Self::Network(_) => UpstreamKind::Network,
            Self::Timeout(_) => UpstreamKind::Timeout,
            Self::MalformedResponse(_) => UpstreamKind::Malformed,
            Self::Config(_) => UpstreamKind::Config,
        }
    }

    /// Upstream HTTP status, for rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse(_) | Self::Config(_) => false,
        }
    }
}
