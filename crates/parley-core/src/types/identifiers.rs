//! Strongly-typed identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Session identifier used when a client does not supply one.
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Opaque, caller-supplied conversation identifier.
///
/// Unlike agent IDs, session IDs are not normalized: two IDs refer to the
/// same conversation only if they are byte-for-byte equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_ID)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
