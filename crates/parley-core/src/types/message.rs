//! Conversation message types.

use crate::context::estimator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the system message that replaces compacted history.
pub const SUMMARY_PREFIX: &str = "conversation summary: ";

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Label used when rendering a transcript for summarization.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a message came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// A turn supplied by the caller or the model.
    #[default]
    Conversation,

    /// A digest inserted by compaction.
    Summary,
}

/// A single entry in a session's history.
///
/// The token estimate is computed once at construction and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender role.
    pub role: Role,

    /// Text content.
    pub content: String,

    /// Approximate token cost of `content`.
    pub token_estimate: usize,

    /// Conversation turn or compaction summary.
    #[serde(default)]
    pub kind: MessageKind,
}

impl Message {
    /// Create a message, estimating its token cost.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            role,
            token_estimate: estimator::estimate(&content),
            content,
            kind: MessageKind::Conversation,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create the system message that stands in for summarized history.
    pub fn summary(digest: &str) -> Self {
        Self {
            kind: MessageKind::Summary,
            ..Self::system(format!("{}{}", SUMMARY_PREFIX, digest))
        }
    }

    /// Whether this message was produced by compaction.
    pub fn is_summary(&self) -> bool {
        self.kind == MessageKind::Summary
    }

    /// Whether this is a system message supplied by the caller.
    pub fn is_leading_system_candidate(&self) -> bool {
        self.role == Role::System && !self.is_summary()
    }
}
