//! Item discovery, cached views, manual re-fetch and queue inspection
//!
//! - `POST /items/discover` runs the orchestrator over a discovery set
//! - `GET /items/:item_id` returns the valid cached view (404 otherwise)
//! - `POST /items/:item_id/refetch` drops the entry and queues the item
//! - `GET /queue` lists pending ids and the in-flight id

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sbe_common::events::BadgeViewInfo;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::ItemId;
use crate::services::{merger, DiscoveryReport};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub item_ids: Vec<ItemId>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
    pub fresh: bool,
    pub degraded: bool,
    pub records: Vec<BadgeViewInfo>,
}

#[derive(Debug, Serialize)]
pub struct RefetchResponse {
    pub item_id: ItemId,
    pub enqueued: bool,
}

#[derive(Debug, Serialize)]
pub struct QueueStatus {
    pub pending: Vec<ItemId>,
    pub in_flight: Option<ItemId>,
}

/// POST /items/discover
pub async fn discover_items(
    State(state): State<AppState>,
    Json(request): Json<DiscoverRequest>,
) -> ApiResult<Json<DiscoveryReport>> {
    if !state.enabled {
        return Err(ApiError::Disabled);
    }
    if request.item_ids.is_empty() {
        return Err(ApiError::BadRequest("item_ids must not be empty".to_string()));
    }

    info!(count = request.item_ids.len(), "Discovery request received");
    Ok(Json(state.orchestrator.discover(&request.item_ids).await))
}

/// GET /items/:item_id
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> ApiResult<Json<ItemView>> {
    let entry = state
        .orchestrator
        .cached_entry(item_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("No valid cache entry for item {}", item_id)))?;

    let records = merger::combine_entry(&entry)
        .iter()
        .map(|r| r.to_view_info(&state.image_cdn_url, item_id))
        .collect();

    Ok(Json(ItemView {
        item_id,
        created_at: entry.created_at,
        fresh: false,
        degraded: entry.degraded,
        records,
    }))
}

/// POST /items/:item_id/refetch
pub async fn refetch_item(
    State(state): State<AppState>,
    Path(item_id): Path<ItemId>,
) -> ApiResult<Json<RefetchResponse>> {
    if !state.enabled {
        return Err(ApiError::Disabled);
    }

    let enqueued = state.orchestrator.refetch(item_id).await;
    Ok(Json(RefetchResponse { item_id, enqueued }))
}

/// GET /queue
pub async fn queue_status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(QueueStatus {
        pending: state.scheduler.pending(),
        in_flight: state.scheduler.in_flight(),
    })
}

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items/discover", post(discover_items))
        .route("/items/:item_id", get(get_item))
        .route("/items/:item_id/refetch", post(refetch_item))
        .route("/queue", get(queue_status))
}
