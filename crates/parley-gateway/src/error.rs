//! Gateway error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parley_agent::AgentError;
use parley_providers::{ProviderError, UpstreamKind};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors that can occur in the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Not found error.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No completion provider is configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// The completion service failed.
    #[error(transparent)]
    Upstream(ProviderError),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short, client-facing description.
    pub error: String,

    /// Underlying cause, when useful to the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl GatewayError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ProviderNotConfigured(_) | Self::Io(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(e) => match e {
                ProviderError::Rejected { status, .. } => {
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
                }
                _ => match e.kind() {
                    UpstreamKind::Network => StatusCode::SERVICE_UNAVAILABLE,
                    UpstreamKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                    UpstreamKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
                    UpstreamKind::Malformed | UpstreamKind::Rejected => StatusCode::BAD_GATEWAY,
                },
            },
        }
    }

    /// Response body for this error.
    pub fn body(&self) -> ErrorBody {
        match self {
            Self::BadRequest(msg) => ErrorBody {
                error: msg.clone(),
                details: None,
            },
            Self::NotFound(what) => ErrorBody {
                error: format!("{} not found", what),
                details: None,
            },
            Self::ProviderNotConfigured(msg) => ErrorBody {
                error: "Completion provider is not configured".to_string(),
                details: Some(msg.clone()),
            },
            Self::Upstream(e) => ErrorBody {
                error: "Failed to get a reply from the completion service".to_string(),
                details: Some(e.to_string()),
            },
            Self::Io(_) | Self::Internal(_) => ErrorBody {
                error: "Internal server error".to_string(),
                details: None,
            },
        }
    }
}

impl From<AgentError> for GatewayError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) => Self::BadRequest(msg),
            AgentError::SessionNotFound(id) => Self::NotFound(format!("Session '{}'", id)),
            AgentError::ProviderNotConfigured(msg) => Self::ProviderNotConfigured(msg),
            AgentError::Upstream(e) => Self::Upstream(e),
            AgentError::Config(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
