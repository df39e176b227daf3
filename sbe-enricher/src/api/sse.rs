//! Server-Sent Events stream of presenter notifications

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events
///
/// Streams `ItemPresented`, `ItemPlaceholder`, `ItemUpdating` and
/// `QueueDrained` events.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sbe_common::sse::create_event_sse_stream("sbe-enricher", &state.event_bus)
}
