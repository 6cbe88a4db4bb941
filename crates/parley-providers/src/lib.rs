//! Completion providers for Parley.
//!
//! This crate provides the client side of the completion service:
//! - [`Provider`]: the chat completion trait the gateway and summarizer use
//! - [`DeepSeekProvider`]: DeepSeek and any other OpenAI-compatible API
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_providers::{ChatMessage, ChatOptions, DeepSeekProvider, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = DeepSeekProvider::new("your-api-key")?;
//!
//!     let messages = vec![ChatMessage::user("Hello!")];
//!     let response = provider.chat(&messages, &ChatOptions::default()).await?;
//!     println!("Response: {}", response.content);
//!
//!     Ok(())
//! }
//! ```

mod error;
mod types;

pub mod deepseek;

pub use deepseek::DeepSeekProvider;
pub use error::{ProviderError, Result, UpstreamKind};
pub use types::*;

use async_trait::async_trait;

/// A model provider that can generate chat completions.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get provider name.
    fn name(&self) -> &str;

    /// Get the default model.
    fn model(&self) -> &str;

    /// Generate a chat completion.
    async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatResponse>;
}
