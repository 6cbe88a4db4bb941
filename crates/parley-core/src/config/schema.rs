//! Configuration schema definitions.

use crate::context::{CompactionPolicy, SummaryInstruction};
use crate::env::vars;
use crate::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main Parley configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Completion provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// History budget and compaction thresholds.
    #[serde(default)]
    pub context: ContextConfig,

    /// Summarizer call settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// Session retention.
    #[serde(default)]
    pub sessions: SessionsConfig,

    /// Persona prompt prepended to every completion request.
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static front-end files, served when it exists.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,

    /// Enable permissive CORS.
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            cors: true,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

/// OpenAI-compatible completion provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL (without `/chat/completions`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,

    /// API key; takes precedence over `api_key_env`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Completion request timeout in seconds.
    #[serde(default = "default_completion_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for replies.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum reply length in tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_completion_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl ProviderConfig {
    /// Completion request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key from the config file, or from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<SecretString> {
        self.api_key
            .clone()
            .filter(|key| !key.is_blank())
            .or_else(|| SecretString::from_env(&self.api_key_env))
    }
}

fn default_base_url() -> String {
    "https://api.deepseek.com/v1".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_api_key_env() -> String {
    vars::DEEPSEEK_API_KEY.to_string()
}

fn default_completion_timeout() -> u64 {
    60
}

fn default_temperature() -> f32 {
    0.9
}

fn default_max_tokens() -> u32 {
    1024
}

/// History budget configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Token ceiling per session.
    #[serde(default = "default_context_max_tokens")]
    pub max_tokens: usize,

    /// Sessions with this many messages or fewer are never compacted.
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,

    /// Most recent messages kept verbatim by compaction.
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_context_max_tokens(),
            min_messages: default_min_messages(),
            keep_recent: default_keep_recent(),
        }
    }
}

impl ContextConfig {
    /// Compaction policy for these settings.
    pub fn policy(&self) -> CompactionPolicy {
        CompactionPolicy::new(self.max_tokens)
            .with_min_messages(self.min_messages)
            .with_keep_recent(self.keep_recent)
    }
}

fn default_context_max_tokens() -> usize {
    crate::context::compactor::DEFAULT_MAX_TOKENS
}

fn default_min_messages() -> usize {
    crate::context::compactor::DEFAULT_MIN_MESSAGES
}

fn default_keep_recent() -> usize {
    crate::context::compactor::DEFAULT_KEEP_RECENT
}

/// Summarizer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Timeout for one summarization call in seconds.
    #[serde(default = "default_summary_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for digests.
    #[serde(default = "default_summary_temperature")]
    pub temperature: f32,

    /// Maximum digest length in tokens.
    #[serde(default = "default_summary_max_tokens")]
    pub max_tokens: u32,

    /// Language the digest is written in.
    #[serde(default = "default_summary_language")]
    pub language: String,

    /// Digest length budget in characters.
    #[serde(default = "default_summary_max_chars")]
    pub max_chars: usize,

    /// What the digest concentrates on.
    #[serde(default = "default_summary_focus")]
    pub focus: String,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_summary_timeout(),
            temperature: default_summary_temperature(),
            max_tokens: default_summary_max_tokens(),
            language: default_summary_language(),
            max_chars: default_summary_max_chars(),
            focus: default_summary_focus(),
        }
    }
}

impl SummarizerConfig {
    /// Timeout for one summarization call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Prompt instruction for these settings.
    pub fn instruction(&self) -> SummaryInstruction {
        SummaryInstruction {
            language: self.language.clone(),
            max_chars: self.max_chars,
            focus: self.focus.clone(),
        }
    }
}

fn default_summary_timeout() -> u64 {
    15
}

fn default_summary_temperature() -> f32 {
    0.3
}

fn default_summary_max_tokens() -> u32 {
    200
}

fn default_summary_language() -> String {
    SummaryInstruction::default().language
}

fn default_summary_max_chars() -> usize {
    SummaryInstruction::default().max_chars
}

fn default_summary_focus() -> String {
    SummaryInstruction::default().focus
}

/// Session retention configuration. A zero value disables the limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Seconds of inactivity before a session is evicted.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,

    /// Maximum number of live sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Seconds between eviction sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

impl SessionsConfig {
    /// Idle TTL, if enabled.
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    /// Session cap, if enabled.
    pub fn capacity(&self) -> Option<usize> {
        (self.max_sessions > 0).then_some(self.max_sessions)
    }

    /// Sweep interval, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn default_idle_ttl() -> u64 {
    24 * 60 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_sweep_interval() -> u64 {
    60
}

/// Persona prompt configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Inline system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// File holding the system prompt; read when `system_prompt` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_file: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string for an `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

fn default_true() -> bool {
    true
}
