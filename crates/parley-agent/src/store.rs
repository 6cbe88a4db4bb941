//! In-memory session store.
//!
//! Sessions live in a sharded [`DashMap`]. Each session sits behind its own
//! [`tokio::sync::Mutex`] so one conversation can await the summarizer
//! while every other conversation keeps moving.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parley_core::context::estimate_messages;
use parley_core::types::{Message, SessionId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Shared, lockable handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// A single conversation's state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,

    /// Chronological history.
    pub messages: Vec<Message>,

    /// Sum of the message token estimates.
    pub total_tokens: usize,

    /// Most recent compaction digest.
    pub summary: Option<String>,

    /// Number of compactions applied.
    pub compactions: u32,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last activity timestamp.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create an empty session.
    pub fn new(id: SessionId) -> Self {
        let now = Utc::now();
        Self {
            id,
            messages: Vec::new(),
            total_tokens: 0,
            summary: None,
            compactions: 0,
            created_at: now,
            last_activity: now,
        }
    }

    /// Append a message and add its estimate to the total.
    pub fn push(&mut self, message: Message) {
        self.total_tokens += message.token_estimate;
        self.messages.push(message);
        self.touch();
    }

    /// Replace the history wholesale and recompute the total from scratch.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.recompute_tokens();
        self.touch();
    }

    /// Recompute `total_tokens` from the messages.
    pub fn recompute_tokens(&mut self) {
        self.total_tokens = estimate_messages(&self.messages);
    }

    /// Get the message count.
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Mark the session as active now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been inactive for longer than `ttl` at `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.last_activity)
            .to_std()
            .map(|idle| idle > ttl)
            .unwrap_or(false)
    }
}

/// Keyed collection of sessions with per-session locking.
pub struct SessionStore {
    /// Live sessions.
    sessions: DashMap<SessionId, SessionHandle>,

    /// Inactivity limit; `None` keeps sessions forever.
    idle_ttl: Option<Duration>,

    /// Session cap; `None` is unbounded.
    capacity: Option<usize>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create an unbounded store with no idle limit.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl: None,
            capacity: None,
        }
    }

    /// Evict sessions idle for longer than `ttl`.
    pub fn with_idle_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.idle_ttl = ttl;
        self
    }

    /// Cap the number of live sessions.
    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    /// Get a session, creating an empty one if absent.
    pub fn get_or_create(&self, id: &SessionId) -> SessionHandle {
        if let Some(handle) = self.sessions.get(id) {
            return handle.clone();
        }

        if let Some(capacity) = self.capacity {
            while self.sessions.len() >= capacity {
                if !self.evict_least_recent() {
                    break;
                }
            }
        }

        self.sessions
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(session = %id, "Created session");
                Arc::new(Mutex::new(Session::new(id.clone())))
            })
            .clone()
    }

    /// Get an existing session.
    pub fn get(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.get(id).map(|handle| handle.clone())
    }

    /// Delete a session. Returns whether one was removed.
    pub fn delete(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            debug!(session = %id, "Deleted session");
        }
        removed
    }

    /// Check whether a session exists.
    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions idle for longer than the configured TTL.
    ///
    /// Sessions that are locked or referenced outside the store are in use
    /// and are skipped. Returns the number of sessions removed.
    pub fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.idle_ttl else {
            return 0;
        };

        let candidates: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .try_lock()
                    .map(|session| session.is_idle(now, ttl))
                    .unwrap_or(false)
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = 0;
        for id in candidates {
            let removed = self.sessions.remove_if(&id, |_, handle| {
                Self::is_unused(handle)
                    && handle
                        .try_lock()
                        .map(|session| session.is_idle(now, ttl))
                        .unwrap_or(false)
            });
            if removed.is_some() {
                evicted += 1;
            }
        }

        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    /// Evict the least recently active unused session.
    fn evict_least_recent(&self) -> bool {
        let oldest = self
            .sessions
            .iter()
            .filter(|entry| Arc::strong_count(entry.value()) == 1)
            .filter_map(|entry| {
                let session = entry.value().try_lock().ok()?;
                Some((session.last_activity, entry.key().clone()))
            })
            .min_by_key(|(last_activity, _)| *last_activity);

        let Some((_, id)) = oldest else {
            return false;
        };

        let removed = self
            .sessions
            .remove_if(&id, |_, handle| Self::is_unused(handle))
            .is_some();
        if removed {
            info!(session = %id, "Evicted least recently active session at capacity");
        }
        removed
    }

    /// A handle only the store references, with no lock held.
    fn is_unused(handle: &SessionHandle) -> bool {
        Arc::strong_count(handle) == 1 && handle.try_lock().is_ok()
    }
}
