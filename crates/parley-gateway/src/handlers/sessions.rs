//! Session status and deletion handlers.

use crate::server::AppState;
use crate::Result;
use axum::{
    extract::{Path, State},
    Json,
};
use parley_agent::SessionStatus;
use parley_core::types::SessionId;
use serde::Serialize;
use std::sync::Arc;

/// `GET /api/session/{id}` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    /// Session identifier.
    pub session_id: SessionId,

    /// Current status.
    #[serde(flatten)]
    pub status: SessionStatus,
}

/// `GET /api/session/{id}`
pub async fn status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>> {
    let session_id = SessionId::new(id);
    let status = state.manager().status(&session_id).await?;
    Ok(Json(SessionStatusResponse { session_id, status }))
}

/// `DELETE /api/session/{id}` response body.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Confirmation text.
    pub message: String,
}

/// `DELETE /api/session/{id}`
///
/// Succeeds whether or not the session existed.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<DeleteResponse> {
    state.manager().delete_session(&SessionId::new(id));
    Json(DeleteResponse {
        message: "Session cleared".to_string(),
    })
}
