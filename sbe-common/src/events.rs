//! Event types for the SBE event system
//!
//! Presenter notifications are published as `SbeEvent`s on an `EventBus`
//! (tokio broadcast channel) and can be serialized for SSE transmission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Why an item is shown without badge details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderReason {
    /// No usable cache entry; a fetch has been queued
    Loading,
    /// A completed fetch (or cached entry) produced no badge records
    NoData,
}

impl PlaceholderReason {
    /// Display text for the placeholder
    pub fn message(&self, item_id: u32) -> String {
        match self {
            PlaceholderReason::Loading => "Loading detailed badge data...".to_string(),
            PlaceholderReason::NoData => format!(
                "No detailed badge data available for this game (App ID: {}).",
                item_id
            ),
        }
    }
}

/// Display-ready badge as sent to presenters and SSE clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeViewInfo {
    pub name: String,
    pub image_url: String,
    pub scarcity: String,
    pub level: u32,
    pub is_foil: bool,
    /// Formatted first completion date, or "Date unavailable"
    pub first_completion: String,
    /// Label such as "Level: 3 (Foil)"
    pub level_label: String,
    /// Matches the crafted level of its foil class
    pub highlighted: bool,
}

/// SBE event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SbeEvent {
    /// Ordered, highlight-annotated badges for an item
    ItemPresented {
        item_id: u32,
        /// False when served from cache, true after a completed fetch cycle
        fresh: bool,
        badges: Vec<BadgeViewInfo>,
        timestamp: DateTime<Utc>,
    },

    /// Item shown without badge details
    ItemPlaceholder {
        item_id: u32,
        reason: PlaceholderReason,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A fetch cycle for the item has started
    ItemUpdating {
        item_id: u32,
        timestamp: DateTime<Utc>,
    },

    /// The fetch queue has no pending or in-flight items
    QueueDrained {
        timestamp: DateTime<Utc>,
    },
}

impl SbeEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            SbeEvent::ItemPresented { .. } => "ItemPresented",
            SbeEvent::ItemPlaceholder { .. } => "ItemPlaceholder",
            SbeEvent::ItemUpdating { .. } => "ItemUpdating",
            SbeEvent::QueueDrained { .. } => "QueueDrained",
        }
    }

    /// Item the event refers to, if any
    pub fn item_id(&self) -> Option<u32> {
        match self {
            SbeEvent::ItemPresented { item_id, .. }
            | SbeEvent::ItemPlaceholder { item_id, .. }
            | SbeEvent::ItemUpdating { item_id, .. } => Some(*item_id),
            SbeEvent::QueueDrained { .. } => None,
        }
    }
}

/// Broadcast bus for `SbeEvent`s
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SbeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SbeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SbeEvent) -> Result<usize, broadcast::error::SendError<SbeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SbeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
