//! Credential handling for provider API keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// An API key that is zeroed on drop and never printed.
///
/// `Debug` and `Display` are redacted; use [`SecretString::masked`] when a
/// recognizable preview is needed (e.g. `parley config show`).
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
    inner: String,
}

impl SecretString {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: value.into(),
        }
    }

    /// Read a credential from an environment variable.
    ///
    /// Unset and blank variables both yield `None`.
    pub fn from_env(name: &str) -> Option<Self> {
        crate::env::get_var(name).map(Self::new)
    }

    /// Expose the secret value.
    ///
    /// Use sparingly - only when building the outgoing request.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }

    /// Check if the secret is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }

    /// Short preview keeping the first three and last four characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.inner.chars().collect();
        if chars.len() <= 8 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(s))
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Config files store the real value
        self.inner.serialize(serializer)
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
