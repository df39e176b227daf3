//! HTTP API handlers for sbe-enricher

pub mod health;
pub mod items;
pub mod sse;

pub use health::health_routes;
pub use items::item_routes;
pub use sse::event_stream;
