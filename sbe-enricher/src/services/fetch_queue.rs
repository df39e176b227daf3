//! Fetch queue and its single worker
//!
//! **Architecture:**
//! - FIFO of pending item ids plus at most one in-flight id
//! - One worker task, started on demand by `enqueue` and exiting when the
//!   queue is empty
//! - Per item: updating signal, D1, enrichment, D2, normal crafted, D2,
//!   foil crafted, persist, present fresh view
//!
//! An item is moved from `pending` to `in_flight` in one step under the state
//! lock, so it is never visible in both. `enqueue` rejects ids found in either.

use sbe_common::config::EnricherSettings;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::data_fetcher::DataFetcher;
use super::merger;
use crate::db::CacheStore;
use crate::models::{CacheEntry, ItemId, Variant};
use crate::presenter::{present_or_no_data, Presenter};

/// Mandatory pacing between remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchDelays {
    /// D1: before the enrichment call
    pub before_enrichment: Duration,
    /// D2: before each crafted-status call
    pub before_crafted: Duration,
}

impl FetchDelays {
    pub fn none() -> Self {
        Self {
            before_enrichment: Duration::ZERO,
            before_crafted: Duration::ZERO,
        }
    }

    pub fn from_settings(settings: &EnricherSettings) -> Self {
        Self {
            before_enrichment: settings.enrichment_delay(),
            before_crafted: settings.crafted_delay(),
        }
    }
}

impl Default for FetchDelays {
    fn default() -> Self {
        Self::from_settings(&EnricherSettings::default())
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<ItemId>,
    in_flight: Option<ItemId>,
    worker_running: bool,
}

struct Inner {
    state: Mutex<QueueState>,
    fetcher: DataFetcher,
    store: CacheStore,
    presenter: Arc<dyn Presenter>,
    delays: FetchDelays,
    idle_tx: watch::Sender<bool>,
    completed_cycles: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serialized, deduplicating fetch scheduler
///
/// Cheap to clone; all clones share one queue and one worker.
#[derive(Clone)]
pub struct FetchQueue {
    inner: Arc<Inner>,
}

impl FetchQueue {
    pub fn new(
        fetcher: DataFetcher,
        store: CacheStore,
        presenter: Arc<dyn Presenter>,
        delays: FetchDelays,
    ) -> Self {
        let (idle_tx, _) = watch::channel(true);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                fetcher,
                store,
                presenter,
                delays,
                idle_tx,
                completed_cycles: AtomicU64::new(0),
            }),
        }
    }

    /// Append an item to the tail unless it is already pending or in flight
    ///
    /// Starts the worker if it is idle. Must be called from within a tokio
    /// runtime. Returns whether the item was added.
    pub fn enqueue(&self, item_id: ItemId) -> bool {
        let start_worker = {
            let mut state = self.inner.lock();

            if state.in_flight == Some(item_id) || state.pending.contains(&item_id) {
                debug!(item_id, "Item already queued or in flight, skipping");
                return false;
            }

            state.pending.push_back(item_id);
            debug!(item_id, queue_size = state.pending.len(), "Enqueued item");

            self.inner.idle_tx.send_replace(false);

            let start = !state.worker_running;
            state.worker_running = true;
            start
        };

        if start_worker {
            debug!("Starting fetch worker");
            tokio::spawn(run_worker(Arc::clone(&self.inner)));
        }

        true
    }

    /// Pending item ids in processing order (excludes the in-flight item)
    pub fn pending(&self) -> Vec<ItemId> {
        self.inner.lock().pending.iter().copied().collect()
    }

    pub fn in_flight(&self) -> Option<ItemId> {
        self.inner.lock().in_flight
    }

    pub fn is_idle(&self) -> bool {
        *self.inner.idle_tx.borrow()
    }

    /// Resolves once nothing is pending or in flight
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.idle_tx.subscribe();
        // Sender lives in `inner`, which `self` keeps alive
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Number of fetch cycles completed since construction (aborted cycles excluded)
    pub fn completed_cycles(&self) -> u64 {
        self.inner.completed_cycles.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &CacheStore {
        &self.inner.store
    }
}

async fn run_worker(inner: Arc<Inner>) {
    loop {
        let item_id = {
            let mut state = inner.lock();
            match state.pending.pop_front() {
                Some(item_id) => {
                    state.in_flight = Some(item_id);
                    item_id
                }
                None => {
                    state.in_flight = None;
                    state.worker_running = false;
                    inner.idle_tx.send_replace(true);
                    break;
                }
            }
        };

        // A panicking collaborator ends only its own cycle
        let outcome = tokio::spawn(run_cycle(Arc::clone(&inner), item_id)).await;

        inner.lock().in_flight = None;
        match outcome {
            Ok(()) => {
                inner.completed_cycles.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                error!(item_id, error = %e, "Fetch cycle aborted");
            }
        }
    }

    info!("Fetch queue drained");
    inner.presenter.queue_drained();
}

async fn run_cycle(inner: Arc<Inner>, item_id: ItemId) {
    info!(item_id, "Starting fetch cycle");
    inner.presenter.present_updating(item_id);

    sleep(inner.delays.before_enrichment).await;
    let enrichment = inner.fetcher.fetch_enrichment(item_id).await;

    sleep(inner.delays.before_crafted).await;
    let normal = inner.fetcher.fetch_crafted_info(item_id, Variant::Normal).await;

    sleep(inner.delays.before_crafted).await;
    let foil = inner.fetcher.fetch_crafted_info(item_id, Variant::Foil).await;

    let degraded = enrichment.degraded || normal.degraded || foil.degraded;
    let entry = CacheEntry::new(item_id, enrichment.value, normal.value, foil.value, degraded);

    if !inner.store.put(&entry).await {
        warn!(item_id, "Fetched badge data was not cached; presenting it anyway");
    }

    let view = merger::combine_entry(&entry);
    present_or_no_data(inner.presenter.as_ref(), item_id, &view, true);

    info!(item_id, records = view.len(), degraded, "Fetch cycle complete");
}
