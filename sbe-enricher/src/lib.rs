//! sbe-enricher library interface
//!
//! Badge enrichment pipeline (cache store and policy, remote clients, merger,
//! fetch queue, orchestrator) plus the HTTP surface used by the binary and
//! integration tests.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod presenter;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sbe_common::events::EventBus;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::{FetchQueue, Orchestrator};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub scheduler: FetchQueue,
    pub orchestrator: Orchestrator,
    /// Event bus carrying presenter notifications to SSE clients
    pub event_bus: EventBus,
    /// Base URL for badge images in item views
    pub image_cdn_url: String,
    /// Master switch; discovery and re-fetch are refused when false
    pub enabled: bool,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        scheduler: FetchQueue,
        orchestrator: Orchestrator,
        event_bus: EventBus,
        image_cdn_url: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            scheduler,
            orchestrator,
            event_bus,
            image_cdn_url: image_cdn_url.into(),
            enabled,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::item_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
