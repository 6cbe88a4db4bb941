//! Context manager: the entry point for conversation state.

use crate::compaction::HistoryCompactor;
use crate::error::AgentError;
use crate::store::SessionStore;
use crate::Result;
use chrono::{DateTime, Utc};
use parley_core::context::ContextCompactor;
use parley_core::types::{Message, SessionId};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Read-only view of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Messages in the history.
    pub message_count: usize,

    /// Estimated tokens in the history.
    pub total_tokens: usize,

    /// Whether a compaction digest has been produced.
    pub has_summary: bool,

    /// Compactions applied so far.
    pub compactions: u32,

    /// Last activity timestamp.
    pub last_activity: DateTime<Utc>,
}

/// Owns the session store and keeps every history within budget.
pub struct ContextManager {
    store: Arc<SessionStore>,
    compactor: HistoryCompactor,
}

impl ContextManager {
    /// Create a manager over `store`.
    pub fn new(store: Arc<SessionStore>, compactor: HistoryCompactor) -> Self {
        Self { store, compactor }
    }

    /// Underlying session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Append a user message, compacting if the session runs over budget.
    ///
    /// Returns the history to send to the completion service. Blank input is
    /// rejected before any session is created or touched.
    pub async fn append(&self, session_id: &SessionId, text: &str) -> Result<Vec<Message>> {
        if text.trim().is_empty() {
            return Err(AgentError::validation("message must not be empty"));
        }

        let handle = self.store.get_or_create(session_id);
        let mut session = handle.lock().await;

        session.push(Message::user(text));
        debug!(
            session = %session_id,
            messages = session.message_count(),
            tokens = session.total_tokens,
            "Appended user message"
        );

        self.compactor.compact_if_needed(&mut session).await;

        Ok(session.messages.clone())
    }

    /// Record the assistant's reply. Never compacts.
    pub async fn record_reply(&self, session_id: &SessionId, text: &str) -> Result<()> {
        let handle = self.store.get_or_create(session_id);
        let mut session = handle.lock().await;
        session.push(Message::assistant(text));
        debug!(
            session = %session_id,
            messages = session.message_count(),
            tokens = session.total_tokens,
            "Recorded assistant reply"
        );
        Ok(())
    }

    /// Install or replace the session's leading system message.
    ///
    /// For embedders that give a session its own persona, typically before
    /// the first turn. The first non-summary system message is replaced
    /// wherever it sits; otherwise the prompt is inserted at index 0. The
    /// gateway does not call this; it prepends the configured persona to
    /// each request instead.
    pub async fn set_system_prompt(&self, session_id: &SessionId, prompt: &str) -> Result<()> {
        if prompt.trim().is_empty() {
            return Err(AgentError::validation("system prompt must not be empty"));
        }

        let handle = self.store.get_or_create(session_id);
        let mut session = handle.lock().await;

        let mut messages = std::mem::take(&mut session.messages);
        match ContextCompactor::leading_system_index(&messages) {
            Some(index) => messages[index] = Message::system(prompt),
            None => messages.insert(0, Message::system(prompt)),
        }
        session.replace_messages(messages);
        Ok(())
    }

    /// Status of an existing session.
    pub async fn status(&self, session_id: &SessionId) -> Result<SessionStatus> {
        let handle = self
            .store
            .get(session_id)
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
        let session = handle.lock().await;

        Ok(SessionStatus {
            message_count: session.message_count(),
            total_tokens: session.total_tokens,
            has_summary: session.summary.is_some(),
            compactions: session.compactions,
            last_activity: session.last_activity,
        })
    }

    /// Snapshot of an existing session's history.
    pub async fn history(&self, session_id: &SessionId) -> Result<Vec<Message>> {
        let handle = self
            .store
            .get(session_id)
            .ok_or_else(|| AgentError::SessionNotFound(session_id.to_string()))?;
        let session = handle.lock().await;
        Ok(session.messages.clone())
    }

    /// Delete a session. Returns whether one existed.
    pub fn delete_session(&self, session_id: &SessionId) -> bool {
        self.store.delete(session_id)
    }

    /// Evict sessions idle past the configured TTL.
    pub fn evict_idle(&self) -> usize {
        self.store.evict_idle(Utc::now())
    }
}
