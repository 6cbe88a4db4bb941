//! History compaction rules.
//!
//! Decides when a session's history must shrink and how the shrunken
//! history is rebuilt once the summarization attempt has an outcome. The
//! summarization call itself lives with the async runtime; everything here
//! is synchronous and side-effect free.

use super::estimator;
use crate::types::Message;

/// Default token ceiling for a session's history.
pub const DEFAULT_MAX_TOKENS: usize = 3000;

/// Sessions with this many messages or fewer are never compacted.
pub const DEFAULT_MIN_MESSAGES: usize = 6;

/// Number of most recent messages kept verbatim by compaction.
pub const DEFAULT_KEEP_RECENT: usize = 4;

/// When compaction fires and how much it keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactionPolicy {
    /// Token ceiling; compaction requires the total to exceed it.
    pub max_tokens: usize,
    /// Compaction requires strictly more messages than this.
    pub min_messages: usize,
    /// Size of the verbatim tail.
    pub keep_recent: usize,
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            min_messages: DEFAULT_MIN_MESSAGES,
            keep_recent: DEFAULT_KEEP_RECENT,
        }
    }
}

impl CompactionPolicy {
    /// Create a policy with the given token ceiling and default thresholds.
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            ..Self::default()
        }
    }

    /// Override the minimum message count.
    pub fn with_min_messages(mut self, min_messages: usize) -> Self {
        self.min_messages = min_messages;
        self
    }

    /// Override the verbatim tail size.
    pub fn with_keep_recent(mut self, keep_recent: usize) -> Self {
        self.keep_recent = keep_recent;
        self
    }

    /// Both the token and the message-count thresholds must be exceeded.
    pub fn should_compact(&self, total_tokens: usize, message_count: usize) -> bool {
        total_tokens > self.max_tokens && message_count > self.min_messages
    }
}

/// Result of the summarization attempt over the older messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompactionOutcome {
    /// The summarizer produced a digest.
    Summarized(String),
    /// The summarizer failed; older messages are dropped without a trace.
    Fallback,
}

impl CompactionOutcome {
    /// Digest text, if summarization succeeded.
    pub fn digest(&self) -> Option<&str> {
        match self {
            Self::Summarized(digest) => Some(digest),
            Self::Fallback => None,
        }
    }
}

/// Result of a compaction operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionResult {
    /// Number of original messages that did not survive verbatim.
    pub messages_removed: usize,
    /// Estimated token count before compaction.
    pub tokens_before: usize,
    /// Estimated token count after compaction.
    pub tokens_after: usize,
    /// Digest if summarization was used, `None` for the fallback.
    pub summary: Option<String>,
}

/// Language, length, and focus asked of the summarizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryInstruction {
    /// Language the digest is written in.
    pub language: String,
    /// Upper bound on digest length, in characters.
    pub max_chars: usize,
    /// What the digest should concentrate on.
    pub focus: String,
}

impl Default for SummaryInstruction {
    fn default() -> Self {
        Self {
            language: "Chinese".to_string(),
            max_chars: 100,
            focus: "relationships between people, key events and emotional changes".to_string(),
        }
    }
}

/// Stateless rules for splitting and rebuilding a message history.
pub struct ContextCompactor;

impl ContextCompactor {
    /// Split into `(head, tail)` where `tail` is the last `keep_recent` messages.
    pub fn split(messages: &[Message], keep_recent: usize) -> (&[Message], &[Message]) {
        let split_point = messages.len().saturating_sub(keep_recent);
        messages.split_at(split_point)
    }

    /// Index of the leading system message: the first caller-supplied
    /// system message. Compaction summaries never qualify.
    pub fn leading_system_index(messages: &[Message]) -> Option<usize> {
        messages.iter().position(Message::is_leading_system_candidate)
    }

    /// Messages the summarizer should digest, or `None` when the head holds
    /// nothing besides the leading system message and compaction must not
    /// happen.
    ///
    /// The leading system message is excluded because it is carried over
    /// verbatim.
    pub fn summarizable(messages: &[Message], keep_recent: usize) -> Option<Vec<Message>> {
        let (head, _) = Self::split(messages, keep_recent);
        let leading = Self::leading_system_index(head);
        let digestible: Vec<Message> = head
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != leading)
            .map(|(_, m)| m.clone())
            .collect();
        (!digestible.is_empty()).then_some(digestible)
    }

    /// Rebuild the history from the summarization outcome.
    ///
    /// - `Summarized(d)`: `[leading system?] + [summary(d)] + tail`
    /// - `Fallback`: `tail`
    ///
    /// The leading system message is re-inserted only when it sat in the
    /// head; one already inside the tail survives as part of it. Returns
    /// `None` when the head holds nothing besides the leading system message.
    pub fn rebuild(
        messages: &[Message],
        keep_recent: usize,
        outcome: &CompactionOutcome,
    ) -> Option<(Vec<Message>, CompactionResult)> {
        let (head, tail) = Self::split(messages, keep_recent);
        let leading_in_head = usize::from(Self::leading_system_index(head).is_some());
        if head.len() == leading_in_head {
            return None;
        }

        let tokens_before = estimator::estimate_messages(messages);

        let (compacted, kept_from_head) = match outcome {
            CompactionOutcome::Summarized(digest) => {
                let mut compacted = Vec::with_capacity(tail.len() + 2);
                let leading = Self::leading_system_index(head).map(|i| head[i].clone());
                let kept = usize::from(leading.is_some());
                compacted.extend(leading);
                compacted.push(Message::summary(digest));
                compacted.extend_from_slice(tail);
                (compacted, kept)
            }
            CompactionOutcome::Fallback => (tail.to_vec(), 0),
        };

        let tokens_after = estimator::estimate_messages(&compacted);

        let result = CompactionResult {
            messages_removed: head.len() - kept_from_head,
            tokens_before,
            tokens_after,
            summary: outcome.digest().map(str::to_string),
        };

        Some((compacted, result))
    }

    /// Build a prompt asking a model to summarize the given messages.
    ///
    /// Formats each message as "Role: content" and appends the language,
    /// length, and focus instructions.
    pub fn build_summary_prompt(
        messages_to_summarize: &[Message],
        instruction: &SummaryInstruction,
    ) -> String {
        let mut prompt = String::from(
            "Summarize the following conversation as a short set of key points, \
             keeping the essential facts and the emotional thread:\n\n",
        );

        for msg in messages_to_summarize {
            prompt.push_str(&format!("{}: {}\n", msg.role.label(), msg.content));
        }

        prompt.push_str(&format!(
            "\nWrite the summary in {}, in no more than {} characters, focusing on {}.",
            instruction.language, instruction.max_chars, instruction.focus
        ));

        prompt
    }
}
