//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::models::ItemId;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when running without cache storage
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub enabled: bool,
    pub cache_enabled: bool,
    pub queue_pending: usize,
    pub in_flight: Option<ItemId>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let cache_enabled = state.scheduler.store().is_enabled();

    Json(HealthResponse {
        status: if cache_enabled { "ok" } else { "degraded" }.to_string(),
        module: "sbe-enricher".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        enabled: state.enabled,
        cache_enabled,
        queue_pending: state.scheduler.pending().len(),
        in_flight: state.scheduler.in_flight(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
