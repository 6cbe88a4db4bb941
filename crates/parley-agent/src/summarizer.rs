//! Summarization of older conversation turns.

use async_trait::async_trait;
use parley_core::config::SummarizerConfig;
use parley_core::context::{ContextCompactor, SummaryInstruction};
use parley_core::types::Message;
use parley_providers::{ChatMessage, ChatOptions, Provider, ProviderError};
use std::sync::Arc;
use tracing::debug;

/// Produces a short digest of a run of messages.
///
/// A trait so tests and alternative backends can stand in for the
/// completion service.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `messages` into a digest.
    async fn summarize(&self, messages: &[Message]) -> Result<String, ProviderError>;
}

/// Summarizer backed by a chat completion provider.
pub struct ProviderSummarizer {
    provider: Arc<dyn Provider>,
    instruction: SummaryInstruction,
    options: ChatOptions,
}

impl ProviderSummarizer {
    /// Create a summarizer with the default instruction and sampling.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self::from_config(provider, &SummarizerConfig::default())
    }

    /// Create a summarizer from configuration.
    pub fn from_config(provider: Arc<dyn Provider>, config: &SummarizerConfig) -> Self {
        Self {
            provider,
            instruction: config.instruction(),
            options: ChatOptions::new()
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
                .with_timeout(config.timeout()),
        }
    }

    /// Prompt instruction in use.
    pub fn instruction(&self) -> &SummaryInstruction {
        &self.instruction
    }
}

#[async_trait]
impl Summarizer for ProviderSummarizer {
    async fn summarize(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let prompt = ContextCompactor::build_summary_prompt(messages, &self.instruction);
        debug!(
            provider = self.provider.name(),
            messages = messages.len(),
            "Requesting conversation summary"
        );

        let response = self
            .provider
            .chat(&[ChatMessage::user(prompt)], &self.options)
            .await?;

        let digest = response.content.trim();
        if digest.is_empty() {
            return Err(ProviderError::malformed("Summary is empty"));
        }
        Ok(digest.to_string())
    }
}

/// Summarizer used when no completion provider is configured.
///
/// Every call fails, so compaction always truncates.
pub struct UnavailableSummarizer;

#[async_trait]
impl Summarizer for UnavailableSummarizer {
    async fn summarize(&self, _messages: &[Message]) -> Result<String, ProviderError> {
        Err(ProviderError::config("no summarization provider configured"))
    }
}
