use axum::Json;
use axum::extract::State;
use serde::Serialize;

use bloxtrack_core::time::unix_now;

use crate::state::AppState;

/// Structured health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Seconds since process start.
    pub uptime: u64,
    /// Current Unix time in seconds.
    pub timestamp: u64,
    pub cached_summaries: usize,
}

/// GET /health — server status, uptime, and cache size.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cached_summaries = state.cache.read().await.len();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: unix_now(),
        cached_summaries,
    })
}
