//! Presenter contract and the event-bus implementation
//!
//! The pipeline never renders anything itself. It reports views through a
//! `Presenter`; the binary installs an `EventPresenter` that turns every call
//! into an `SbeEvent` for SSE clients.

use chrono::Utc;
use sbe_common::events::{EventBus, PlaceholderReason, SbeEvent};

use crate::models::{AnnotatedRecord, ItemId};

pub trait Presenter: Send + Sync {
    /// Ordered, highlight-annotated records for an item
    ///
    /// `fresh` is false for cached views and true after a completed fetch cycle.
    fn present(&self, item_id: ItemId, records: &[AnnotatedRecord], fresh: bool);

    fn present_placeholder(&self, item_id: ItemId, reason: PlaceholderReason);

    /// A fetch cycle for the item is starting
    fn present_updating(&self, _item_id: ItemId) {}

    /// No pending or in-flight items remain
    fn queue_drained(&self) {}
}

/// Present a merged view, or the no-data placeholder when it is empty
pub fn present_or_no_data(
    presenter: &dyn Presenter,
    item_id: ItemId,
    records: &[AnnotatedRecord],
    fresh: bool,
) {
    if records.is_empty() {
        presenter.present_placeholder(item_id, PlaceholderReason::NoData);
    } else {
        presenter.present(item_id, records, fresh);
    }
}

/// Publishes presenter calls on the event bus
pub struct EventPresenter {
    event_bus: EventBus,
    image_cdn_url: String,
}

impl EventPresenter {
    pub fn new(event_bus: EventBus, image_cdn_url: impl Into<String>) -> Self {
        Self {
            event_bus,
            image_cdn_url: image_cdn_url.into(),
        }
    }
}

impl Presenter for EventPresenter {
    fn present(&self, item_id: ItemId, records: &[AnnotatedRecord], fresh: bool) {
        let badges = records
            .iter()
            .map(|r| r.to_view_info(&self.image_cdn_url, item_id))
            .collect();

        self.event_bus.emit_lossy(SbeEvent::ItemPresented {
            item_id,
            fresh,
            badges,
            timestamp: Utc::now(),
        });
    }

    fn present_placeholder(&self, item_id: ItemId, reason: PlaceholderReason) {
        self.event_bus.emit_lossy(SbeEvent::ItemPlaceholder {
            item_id,
            reason,
            message: reason.message(item_id),
            timestamp: Utc::now(),
        });
    }

    fn present_updating(&self, item_id: ItemId) {
        self.event_bus.emit_lossy(SbeEvent::ItemUpdating {
            item_id,
            timestamp: Utc::now(),
        });
    }

    fn queue_drained(&self) {
        self.event_bus.emit_lossy(SbeEvent::QueueDrained {
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EnrichmentRecord;

    fn annotated(level: u32, highlighted: bool) -> AnnotatedRecord {
        AnnotatedRecord {
            record: EnrichmentRecord {
                name: format!("Level {}", level),
                image_ref: "img.png".to_string(),
                scarcity: "10".to_string(),
                base_level: level,
                is_foil: false,
                first_completion: None,
            },
            highlighted,
        }
    }

    #[tokio::test]
    async fn test_present_emits_view_info() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let presenter = EventPresenter::new(bus, "https://cdn.example/items/");

        presenter.present(730, &[annotated(1, false), annotated(2, true)], true);

        match rx.recv().await.unwrap() {
            SbeEvent::ItemPresented {
                item_id,
                fresh,
                badges,
                ..
            } => {
                assert_eq!(item_id, 730);
                assert!(fresh);
                assert_eq!(badges.len(), 2);
                assert_eq!(badges[0].image_url, "https://cdn.example/items/730/img.png");
                assert!(badges[1].highlighted);
                assert_eq!(badges[1].level_label, "Level: 2");
            }
            other => panic!("Expected ItemPresented, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_view_becomes_no_data_placeholder() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let presenter = EventPresenter::new(bus, "https://cdn.example");

        present_or_no_data(&presenter, 440, &[], true);

        match rx.recv().await.unwrap() {
            SbeEvent::ItemPlaceholder {
                item_id,
                reason,
                message,
                ..
            } => {
                assert_eq!(item_id, 440);
                assert_eq!(reason, PlaceholderReason::NoData);
                assert!(message.contains("App ID: 440"));
            }
            other => panic!("Expected ItemPlaceholder, got {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let presenter = EventPresenter::new(EventBus::new(4), "https://cdn.example");
        presenter.present_updating(1);
        presenter.queue_drained();
    }
}
