//! DeepSeek provider.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol, so any
//! compatible endpoint works by pointing `base_url` elsewhere.

use crate::{ChatMessage, ChatOptions, ChatResponse, Provider, ProviderError, Result, Usage};
use async_trait::async_trait;
use parley_core::config::ProviderConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default DeepSeek API base URL.
const DEFAULT_API_BASE: &str = "https://api.deepseek.com/v1";

/// Default model.
const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default request deadline.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// DeepSeek chat completion provider.
pub struct DeepSeekProvider {
    /// HTTP client.
    client: Client,

    /// API key.
    api_key: SecretString,

    /// API base URL.
    api_base: String,

    /// Default model to use.
    default_model: String,

    /// Default request deadline.
    timeout: Duration,

    /// Default sampling temperature.
    temperature: Option<f32>,

    /// Default completion length.
    max_tokens: Option<u32>,
}

impl DeepSeekProvider {
    /// Create a new provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::config("API key is required"));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ProviderError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: SecretString::new(api_key),
            api_base: DEFAULT_API_BASE.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Create a provider from configuration, resolving the API key from the
    /// config file or its environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            ProviderError::config(format!(
                "No API key configured; set {} or provider.api_key",
                config.api_key_env
            ))
        })?;

        Ok(Self::new(api_key.expose_secret())?
            .with_base_url(&config.base_url)
            .with_model(&config.model)
            .with_timeout(config.timeout())
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens))
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the default request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the default temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the default completion length.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Completions endpoint.
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    /// Build the request body, applying per-request overrides.
    fn build_request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        options: &'a ChatOptions,
    ) -> ApiRequest<'a> {
        ApiRequest {
            model: options.model.as_deref().unwrap_or(&self.default_model),
            messages: messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: options.temperature.or(self.temperature),
            max_tokens: options.max_tokens.or(self.max_tokens),
            stream: false,
        }
    }

    /// Pull a readable message out of an error body.
    fn error_message(body: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|b| b.error.and_then(|e| e.message))
            .unwrap_or_else(|| body.trim().to_string())
    }

    /// Map a successful response body to a [`ChatResponse`].
    fn parse_response(body: &str) -> Result<ChatResponse> {
        let api_response: ApiResponse = serde_json::from_str(body)
            .map_err(|e| ProviderError::malformed(format!("Invalid JSON: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::malformed("No response choices"))?;

        let content = choice
            .message
            .content
            .ok_or_else(|| ProviderError::malformed("Choice has no content"))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            finish_reason: choice.finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl Provider for DeepSeekProvider {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.default_model
    }

    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse> {
        let request = self.build_request(messages, options);
        let timeout = options.timeout.unwrap_or(self.timeout);

        debug!(
            model = request.model,
            messages = messages.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Sending request to DeepSeek API"
        );

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .timeout(timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(e, timeout))?;

        if !status.is_success() {
            return Err(ProviderError::rejected(
                status.as_u16(),
                Self::error_message(&body),
            ));
        }

        let parsed = Self::parse_response(&body)?;
        debug!(
            prompt_tokens = parsed.usage.prompt_tokens,
            completion_tokens = parsed.usage.completion_tokens,
            "DeepSeek response received"
        );
        Ok(parsed)
    }
}

// API types (OpenAI-compatible)

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}
