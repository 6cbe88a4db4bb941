//! Request and response types shared by providers.

use parley_core::types::{Message, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A message sent to the completion service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message role.
    pub role: Role,

    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Create a message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// Per-request overrides. Unset fields fall back to the provider defaults.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Model override.
    pub model: Option<String>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Maximum completion length in tokens.
    pub max_tokens: Option<u32>,

    /// Request deadline.
    pub timeout: Option<Duration>,
}

impl ChatOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum completion length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Prompt tokens.
    pub prompt_tokens: u32,

    /// Completion tokens.
    pub completion_tokens: u32,
}

impl Usage {
    /// Total tokens billed.
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A completed chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatResponse {
    /// Text of the first choice.
    pub content: String,

    /// Why generation stopped, if reported.
    pub finish_reason: Option<String>,

    /// Token usage, if reported.
    pub usage: Usage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_history_message() {
        let msg = ChatMessage::from(&Message::summary("they met at the harbour"));
        assert_eq!(msg.role, Role::System);
        assert_eq!(msg.content, "conversation summary: they met at the harbour");
    }

    #[test]
    fn test_wire_role_is_lowercase() {
        let json = serde_json::to_value(ChatMessage::assistant("hi")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "hi");
    }

    #[test]
    fn test_options_builder() {
        let opts = ChatOptions::new()
            .with_temperature(0.3)
            .with_max_tokens(200)
            .with_timeout(Duration::from_secs(15));
        assert_eq!(opts.model, None);
        assert_eq!(opts.temperature, Some(0.3));
        assert_eq!(opts.max_tokens, Some(200));
        assert_eq!(opts.timeout, Some(Duration::from_secs(15)));
    }
}
