//! Chat turn handler.

use crate::error::GatewayError;
use crate::server::AppState;
use crate::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use parley_core::types::SessionId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// `POST /api/chat` request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// User message.
    #[serde(default)]
    pub message: Option<String>,

    /// Conversation to continue; a blank or missing ID uses the default.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// The session this request addresses.
    pub fn session_id(&self) -> SessionId {
        match self.session_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => SessionId::new(id),
            _ => SessionId::default(),
        }
    }
}

/// `POST /api/chat` response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Assistant reply.
    pub reply: String,

    /// Session the turn was recorded in.
    pub session_id: SessionId,

    /// Messages in the session after the turn.
    pub message_count: usize,

    /// Estimated tokens in the session after the turn.
    pub estimated_tokens: usize,
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>> {
    let Json(request) = payload.map_err(|e| GatewayError::BadRequest(e.body_text()))?;

    let message = request
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| GatewayError::BadRequest("Message is required".to_string()))?;
    let session_id = request.session_id();

    debug!(session = %session_id, chars = message.chars().count(), "Chat request");

    let turn = state.runtime.process_message(&session_id, message).await?;

    Ok(Json(ChatReply {
        reply: turn.reply,
        session_id: turn.session_id,
        message_count: turn.message_count,
        estimated_tokens: turn.estimated_tokens,
    }))
}
