//! HTTP chat gateway for Parley.
//!
//! This crate provides:
//! - `POST /api/chat` running one conversation turn
//! - `GET`/`DELETE /api/session/{id}` for session status and removal
//!   (`/api/sessions/{id}` is accepted too)
//! - `GET /api/test` liveness probe
//! - Static front-end files and a background idle-session sweeper

pub mod error;
pub mod handlers;
pub mod server;

pub use error::GatewayError;
pub use server::{build_router, spawn_session_sweeper, AppState, Gateway};

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
