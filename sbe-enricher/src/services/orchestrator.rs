//! Initial cache reconciliation for discovered items
//!
//! For every discovered id: a valid entry is presented at once (`fresh=false`)
//! and refreshed in the background only when soft-stale; an absent or invalid
//! entry gets a loading placeholder and is always queued.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use super::cache_policy::CachePolicy;
use super::fetch_queue::FetchQueue;
use super::merger;
use crate::db::CacheStore;
use crate::models::{CacheEntry, ItemId};
use crate::presenter::{present_or_no_data, Presenter};
use sbe_common::events::PlaceholderReason;

/// Cache state found for a discovered item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// Valid entry presented; no refresh needed
    CachedFresh,
    /// Valid entry presented and a background refresh requested
    CachedSoftStale,
    /// Absent or invalid entry; placeholder shown and fetch requested
    Missing,
}

impl Reconciliation {
    pub fn wants_fetch(&self) -> bool {
        !matches!(self, Reconciliation::CachedFresh)
    }
}

/// Outcome of one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Distinct ids processed, in discovery order
    pub processed: usize,
    /// Ids actually added to the fetch queue
    pub enqueued: Vec<ItemId>,
}

#[derive(Clone)]
pub struct Orchestrator {
    queue: FetchQueue,
    store: CacheStore,
    policy: CachePolicy,
    presenter: Arc<dyn Presenter>,
}

impl Orchestrator {
    pub fn new(
        queue: FetchQueue,
        store: CacheStore,
        policy: CachePolicy,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            queue,
            store,
            policy,
            presenter,
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Present the cached state of one item and queue a fetch if needed
    ///
    /// Returns the cache state and whether the item was newly enqueued.
    pub async fn reconcile(&self, item_id: ItemId) -> (Reconciliation, bool) {
        let outcome = match self.cached_entry(item_id).await {
            Some(entry) => {
                let view = merger::combine_entry(&entry);
                present_or_no_data(self.presenter.as_ref(), item_id, &view, false);

                if self.policy.is_soft_stale(&entry) {
                    debug!(item_id, "Cached entry is soft-stale, refreshing in background");
                    Reconciliation::CachedSoftStale
                } else {
                    Reconciliation::CachedFresh
                }
            }
            None => {
                self.presenter
                    .present_placeholder(item_id, PlaceholderReason::Loading);
                Reconciliation::Missing
            }
        };

        let enqueued = outcome.wants_fetch() && self.queue.enqueue(item_id);
        (outcome, enqueued)
    }

    /// Reconcile a discovered set of ids; duplicates are processed once
    pub async fn discover(&self, item_ids: &[ItemId]) -> DiscoveryReport {
        let mut seen = HashSet::new();
        let mut report = DiscoveryReport::default();

        for &item_id in item_ids {
            if !seen.insert(item_id) {
                continue;
            }
            let (_, enqueued) = self.reconcile(item_id).await;
            report.processed += 1;
            if enqueued {
                report.enqueued.push(item_id);
            }
        }

        info!(
            processed = report.processed,
            enqueued = report.enqueued.len(),
            "Discovery pass complete"
        );
        report
    }

    /// Manual re-fetch: drop the cached entry and queue the item
    ///
    /// Validity is not consulted. Returns whether the item was newly enqueued.
    pub async fn refetch(&self, item_id: ItemId) -> bool {
        if !self.store.remove(item_id).await {
            debug!(item_id, "Cache entry could not be removed before re-fetch");
        }
        let enqueued = self.queue.enqueue(item_id);
        info!(item_id, enqueued, "Manual re-fetch requested");
        enqueued
    }

    /// Valid cached entry for an item, if any
    pub async fn cached_entry(&self, item_id: ItemId) -> Option<CacheEntry> {
        self.store
            .get(item_id)
            .await
            .filter(|entry| self.policy.is_valid(entry))
    }
}
