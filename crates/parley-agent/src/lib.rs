//! Session management and conversation runtime for Parley.
//!
//! This crate provides the stateful half of the context manager:
//! - [`SessionStore`]: in-memory sessions with per-session locking and eviction
//! - [`HistoryCompactor`]: summarize-or-truncate when a history runs over budget
//! - [`ContextManager`]: append, reply, status, and delete over the store
//! - [`ChatRuntime`]: one full turn against a completion provider

pub mod compaction;
pub mod error;
pub mod manager;
pub mod runtime;
pub mod store;
pub mod summarizer;

pub use compaction::HistoryCompactor;
pub use error::AgentError;
pub use manager::{ContextManager, SessionStatus};
pub use runtime::{ChatRuntime, RuntimeConfig, TurnReply};
pub use store::{Session, SessionHandle, SessionStore};
pub use summarizer::{ProviderSummarizer, Summarizer, UnavailableSummarizer};

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
