//! History compaction driver.
//!
//! Wraps the pure rebuild rules from [`parley_core::context`] with the
//! summarizer call. The summarizer runs under a deadline; any failure,
//! including an expired deadline, degrades to dropping the older messages.

use crate::store::Session;
use crate::summarizer::Summarizer;
use parley_core::config::{ContextConfig, SummarizerConfig};
use parley_core::context::{CompactionOutcome, CompactionPolicy, CompactionResult, ContextCompactor};
use parley_core::types::Message;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default deadline for one summarizer call.
pub const DEFAULT_SUMMARY_TIMEOUT: Duration = Duration::from_secs(15);

/// Keeps a session's history inside its token budget.
pub struct HistoryCompactor {
    policy: CompactionPolicy,
    summarizer: Arc<dyn Summarizer>,
    timeout: Duration,
}

impl HistoryCompactor {
    /// Create a compactor with the default policy and deadline.
    pub fn new(summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            policy: CompactionPolicy::default(),
            summarizer,
            timeout: DEFAULT_SUMMARY_TIMEOUT,
        }
    }

    /// Create a compactor from configuration.
    pub fn from_config(
        summarizer: Arc<dyn Summarizer>,
        context: &ContextConfig,
        config: &SummarizerConfig,
    ) -> Self {
        Self::new(summarizer)
            .with_policy(context.policy())
            .with_timeout(config.timeout())
    }

    /// Set the compaction policy.
    pub fn with_policy(mut self, policy: CompactionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the summarizer deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Active policy.
    pub fn policy(&self) -> &CompactionPolicy {
        &self.policy
    }

    /// Whether `session` is over budget.
    pub fn needs_compaction(&self, session: &Session) -> bool {
        self.policy
            .should_compact(session.total_tokens, session.message_count())
    }

    /// Compact `session` if it is over budget.
    ///
    /// Returns `None` when nothing changed. The summarizer is never allowed
    /// to fail the caller.
    pub async fn compact_if_needed(&self, session: &mut Session) -> Option<CompactionResult> {
        if !self.needs_compaction(session) {
            return None;
        }
        self.compact(session).await
    }

    /// Compact `session` unconditionally, unless there is nothing older
    /// than the retained tail.
    pub async fn compact(&self, session: &mut Session) -> Option<CompactionResult> {
        let keep = self.policy.keep_recent;
        let to_summarize = ContextCompactor::summarizable(&session.messages, keep)?;

        let outcome = self.summarize(session, &to_summarize).await;
        let (messages, result) = ContextCompactor::rebuild(&session.messages, keep, &outcome)?;

        session.replace_messages(messages);
        if let CompactionOutcome::Summarized(digest) = outcome {
            session.summary = Some(digest);
        }
        session.compactions += 1;

        info!(
            session = %session.id,
            removed = result.messages_removed,
            tokens_before = result.tokens_before,
            tokens_after = result.tokens_after,
            summarized = result.summary.is_some(),
            "Compacted conversation history"
        );

        Some(result)
    }

    /// Run the summarizer under the deadline and classify the result.
    async fn summarize(&self, session: &Session, messages: &[Message]) -> CompactionOutcome {
        match tokio::time::timeout(self.timeout, self.summarizer.summarize(messages)).await {
            Ok(Ok(digest)) if !digest.trim().is_empty() => {
                CompactionOutcome::Summarized(digest.trim().to_string())
            }
            Ok(Ok(_)) => {
                warn!(
                    session = %session.id,
                    "Summarizer returned an empty digest; truncating history"
                );
                CompactionOutcome::Fallback
            }
            Ok(Err(e)) => {
                warn!(
                    session = %session.id,
                    kind = e.kind().as_str(),
                    error = %e,
                    "Summarization failed; truncating history"
                );
                CompactionOutcome::Fallback
            }
            Err(_) => {
                warn!(
                    session = %session.id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Summarization timed out; truncating history"
                );
                CompactionOutcome::Fallback
            }
        }
    }
}
