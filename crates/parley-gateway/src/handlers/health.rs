//! Liveness probe.

use crate::server::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Liveness response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    /// Fixed status message.
    pub message: String,

    /// Server time, RFC 3339.
    pub timestamp: String,

    /// Seconds since the server started.
    pub uptime_seconds: i64,
}

/// `GET /api/test`
pub async fn test(State(state): State<Arc<AppState>>) -> Json<TestResponse> {
    let now = Utc::now();
    Json(TestResponse {
        message: "Server is running".to_string(),
        timestamp: now.to_rfc3339(),
        uptime_seconds: (now - state.started_at).num_seconds().max(0),
    })
}
