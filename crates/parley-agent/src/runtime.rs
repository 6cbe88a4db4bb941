//! Conversation runtime: one user turn against the completion service.

use crate::error::AgentError;
use crate::manager::ContextManager;
use crate::Result;
use parley_core::config::ProviderConfig;
use parley_core::types::{Message, SessionId};
use parley_providers::{ChatMessage, ChatOptions, Provider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Configuration for the conversation runtime.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Persona prompt prepended to every request.
    pub system_prompt: Option<String>,

    /// Completion options for replies.
    pub options: ChatOptions,
}

impl RuntimeConfig {
    /// Reply options taken from provider configuration.
    pub fn from_provider(config: &ProviderConfig, system_prompt: Option<String>) -> Self {
        Self {
            system_prompt,
            options: ChatOptions::new()
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens)
                .with_timeout(config.timeout()),
        }
    }
}

/// Outcome of a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Assistant reply text.
    pub reply: String,

    /// Session the turn belongs to.
    pub session_id: SessionId,

    /// Messages in the session after the reply was recorded.
    pub message_count: usize,

    /// Estimated tokens in the session after the reply was recorded.
    pub estimated_tokens: usize,
}

/// Runs chat turns: append, complete, record.
pub struct ChatRuntime {
    manager: Arc<ContextManager>,
    provider: Option<Arc<dyn Provider>>,
    config: RuntimeConfig,
}

impl ChatRuntime {
    /// Create a runtime. With no provider every turn fails with
    /// [`AgentError::ProviderNotConfigured`].
    pub fn new(manager: Arc<ContextManager>, provider: Option<Arc<dyn Provider>>) -> Self {
        Self {
            manager,
            provider,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the runtime configuration.
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Context manager backing this runtime.
    pub fn manager(&self) -> &Arc<ContextManager> {
        &self.manager
    }

    /// Whether a completion provider is available.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Build the request: persona prompt, then the session history.
    ///
    /// The persona is left out when the history already carries its own
    /// leading system prompt. Compaction summaries go out as system messages.
    pub fn build_request(&self, history: &[Message]) -> Vec<ChatMessage> {
        let mut request = Vec::with_capacity(history.len() + 1);

        let has_own_prompt = history
            .first()
            .map(Message::is_leading_system_candidate)
            .unwrap_or(false);
        if !has_own_prompt {
            if let Some(prompt) = &self.config.system_prompt {
                request.push(ChatMessage::system(prompt.clone()));
            }
        }

        request.extend(history.iter().map(ChatMessage::from));
        request
    }

    /// Process one user message and return the assistant's reply.
    ///
    /// On a completion failure the user message stays in the history and
    /// the classified error is returned.
    pub async fn process_message(&self, session_id: &SessionId, text: &str) -> Result<TurnReply> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            AgentError::ProviderNotConfigured("no completion API key is configured".to_string())
        })?;

        let history = self.manager.append(session_id, text).await?;
        let request = self.build_request(&history);

        debug!(
            session = %session_id,
            provider = provider.name(),
            messages = request.len(),
            "Requesting completion"
        );

        let response = match provider.chat(&request, &self.config.options).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    session = %session_id,
                    kind = e.kind().as_str(),
                    error = %e,
                    "Completion failed"
                );
                return Err(e.into());
            }
        };

        self.manager
            .record_reply(session_id, &response.content)
            .await?;
        let status = self.manager.status(session_id).await?;

        Ok(TurnReply {
            reply: response.content,
            session_id: session_id.clone(),
            message_count: status.message_count,
            estimated_tokens: status.total_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compaction::HistoryCompactor;
    use crate::store::SessionStore;
    use crate::summarizer::Summarizer;
    use async_trait::async_trait;
    use parley_core::types::Role;
    use parley_providers::{ChatResponse, ProviderError, Usage};
    use std::sync::Mutex;

    struct NoopSummarizer;

    #[async_trait]
    impl Summarizer for NoopSummarizer {
        async fn summarize(
            &self,
            _messages: &[Message],
        ) -> std::result::Result<String, ProviderError> {
            Ok("summary".to_string())
        }
    }

    /// Replies with a fixed text, or fails with a 401 when `reply` is `None`.
    struct ScriptedProvider {
        reply: Option<&'static str>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> parley_providers::Result<ChatResponse> {
            self.requests.lock().unwrap().push(messages.to_vec());
            match self.reply {
                Some(reply) => Ok(ChatResponse {
                    content: reply.to_string(),
                    finish_reason: Some("stop".to_string()),
                    usage: Usage::default(),
                }),
                None => Err(ProviderError::rejected(401, "Authentication Fails")),
            }
        }
    }

    fn context_manager() -> Arc<ContextManager> {
        Arc::new(ContextManager::new(
            Arc::new(SessionStore::new()),
            HistoryCompactor::new(Arc::new(NoopSummarizer)),
        ))
    }

    fn persona() -> RuntimeConfig {
        RuntimeConfig {
            system_prompt: Some("You are Aliya.".to_string()),
            options: ChatOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_turn_records_reply() {
        let provider = ScriptedProvider::replying("Welcome aboard.");
        let runtime =
            ChatRuntime::new(context_manager(), Some(provider.clone())).with_config(persona());
        let id = SessionId::new("s1");

        let turn = runtime.process_message(&id, "Hello").await.unwrap();

        assert_eq!(turn.reply, "Welcome aboard.");
        assert_eq!(turn.session_id, id);
        assert_eq!(turn.message_count, 2);
        assert_eq!(turn.estimated_tokens, 1 + 2);

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0], ChatMessage::system("You are Aliya."));
        assert_eq!(requests[0][1], ChatMessage::user("Hello"));
    }

    #[tokio::test]
    async fn test_failed_completion_keeps_user_message() {
        let runtime = ChatRuntime::new(context_manager(), Some(ScriptedProvider::rejecting()));
        let id = SessionId::new("s1");

        let err = runtime.process_message(&id, "Hello").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Upstream(ProviderError::Rejected { status: 401, .. })
        ));

        let history = runtime.manager().history(&id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_missing_provider() {
        let runtime = ChatRuntime::new(context_manager(), None);
        let err = runtime
            .process_message(&SessionId::new("s1"), "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ProviderNotConfigured(_)));
        assert!(runtime.manager().store().is_empty());
    }

    #[tokio::test]
    async fn test_blank_message_is_validation_error() {
        let runtime = ChatRuntime::new(
            context_manager(),
            Some(ScriptedProvider::replying("unused")),
        );
        let err = runtime
            .process_message(&SessionId::new("s1"), "  ")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_request_skips_persona_when_session_has_prompt() {
        let runtime = ChatRuntime::new(context_manager(), None).with_config(persona());
        let history = vec![Message::system("You are Keir."), Message::user("hi")];

        let request = runtime.build_request(&history);
        assert_eq!(request.len(), 2);
        assert_eq!(request[0].content, "You are Keir.");
    }

    #[test]
    fn test_request_sends_summary_after_persona() {
        let runtime = ChatRuntime::new(context_manager(), None).with_config(persona());
        let history = vec![Message::summary("they met"), Message::user("and then?")];

        let request = runtime.build_request(&history);
        assert_eq!(request.len(), 3);
        assert_eq!(request[0].content, "You are Aliya.");
        assert_eq!(request[1].role, Role::System);
        assert_eq!(request[1].content, "conversation summary: they met");
    }

    #[test]
    fn test_from_provider_config() {
        let config = RuntimeConfig::from_provider(&ProviderConfig::default(), None);
        assert_eq!(config.options.max_tokens, Some(1024));
        assert_eq!(config.options.timeout, Some(std::time::Duration::from_secs(60)));
    }
}
