//! # parley-core
//!
//! Core types, configuration, and utilities for Parley.
//!
//! This crate provides shared functionality used across all Parley crates:
//!
//! - **Types**: Roles, messages, and session identifiers
//! - **Context**: Token estimation and the history compaction rules
//! - **Configuration**: Loading, validation, and environment overrides

pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod secret;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{Error, Result};
pub use secret::SecretString;
pub use types::*;
