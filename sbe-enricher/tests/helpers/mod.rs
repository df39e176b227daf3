//! Shared test doubles for sbe-enricher integration tests
//!
//! - `ScriptedSource`: in-process `BadgeSource` with per-item responses, a
//!   call log and an optional gate that holds enrichment calls
//! - `RecordingPresenter`: records every presenter call in order

#![allow(dead_code)]

use async_trait::async_trait;
use sbe_common::events::PlaceholderReason;
use sbe_enricher::db::CacheStore;
use sbe_enricher::models::{AnnotatedRecord, CraftedInfo, EnrichmentRecord, ItemId, Variant};
use sbe_enricher::presenter::Presenter;
use sbe_enricher::services::{
    BadgeSource, CachePolicy, DataFetcher, FetchDelays, FetchError, FetchQueue, Orchestrator,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, Semaphore};
use tokio::time::Instant;

/// A remote call observed by `ScriptedSource`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Enrichment(ItemId),
    Crafted(ItemId, Variant),
}

#[derive(Default)]
pub struct ScriptedSource {
    badges: HashMap<ItemId, Vec<EnrichmentRecord>>,
    crafted: HashMap<(ItemId, Variant), u32>,
    failing_enrichment: HashSet<ItemId>,
    failing_crafted: HashSet<ItemId>,
    gate: Option<Arc<Semaphore>>,
    calls: Mutex<Vec<(Call, Instant)>>,
    /// Notified whenever an enrichment call starts
    pub enrichment_started: Notify,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_badges(mut self, item_id: ItemId, records: Vec<EnrichmentRecord>) -> Self {
        self.badges.insert(item_id, records);
        self
    }

    pub fn with_crafted(mut self, item_id: ItemId, variant: Variant, level: u32) -> Self {
        self.crafted.insert((item_id, variant), level);
        self
    }

    pub fn with_enrichment_failure(mut self, item_id: ItemId) -> Self {
        self.failing_enrichment.insert(item_id);
        self
    }

    pub fn with_crafted_failure(mut self, item_id: ItemId) -> Self {
        self.failing_crafted.insert(item_id);
        self
    }

    /// Every enrichment call waits for (and consumes) one permit
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(call, _)| *call).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn enrichment_calls(&self, item_id: ItemId) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == Call::Enrichment(item_id))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }
}

#[async_trait]
impl BadgeSource for ScriptedSource {
    async fn list_badges(&self, item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError> {
        self.enrichment_started.notify_one();
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.record(Call::Enrichment(item_id));

        if self.failing_enrichment.contains(&item_id) {
            return Err(FetchError::Network("connection reset".to_string()));
        }
        Ok(self.badges.get(&item_id).cloned().unwrap_or_default())
    }

    async fn crafted_info(&self, item_id: ItemId, variant: Variant) -> Result<CraftedInfo, FetchError> {
        self.record(Call::Crafted(item_id, variant));

        if self.failing_crafted.contains(&item_id) {
            return Err(FetchError::Parse("expected value".to_string()));
        }
        let level = self.crafted.get(&(item_id, variant)).copied().unwrap_or(0);
        Ok(CraftedInfo::from_level(level))
    }
}

/// A presenter call observed by `RecordingPresenter`
#[derive(Debug, Clone, PartialEq)]
pub enum Presented {
    View {
        item_id: ItemId,
        records: Vec<AnnotatedRecord>,
        fresh: bool,
    },
    Placeholder {
        item_id: ItemId,
        reason: PlaceholderReason,
    },
    Updating(ItemId),
    Drained,
}

#[derive(Default)]
pub struct RecordingPresenter {
    calls: Mutex<Vec<Presented>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Presented> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls concerning one item, in order
    pub fn calls_for(&self, item_id: ItemId) -> Vec<Presented> {
        self.calls()
            .into_iter()
            .filter(|call| match call {
                Presented::View { item_id: id, .. } | Presented::Placeholder { item_id: id, .. } => {
                    *id == item_id
                }
                Presented::Updating(id) => *id == item_id,
                Presented::Drained => false,
            })
            .collect()
    }

    /// `(fresh, records)` for every view presented for the item
    pub fn views_for(&self, item_id: ItemId) -> Vec<(bool, Vec<AnnotatedRecord>)> {
        self.calls_for(item_id)
            .into_iter()
            .filter_map(|call| match call {
                Presented::View { records, fresh, .. } => Some((fresh, records)),
                _ => None,
            })
            .collect()
    }

    pub fn placeholders_for(&self, item_id: ItemId) -> Vec<PlaceholderReason> {
        self.calls_for(item_id)
            .into_iter()
            .filter_map(|call| match call {
                Presented::Placeholder { reason, .. } => Some(reason),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Presented) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Presenter for RecordingPresenter {
    fn present(&self, item_id: ItemId, records: &[AnnotatedRecord], fresh: bool) {
        self.push(Presented::View {
            item_id,
            records: records.to_vec(),
            fresh,
        });
    }

    fn present_placeholder(&self, item_id: ItemId, reason: PlaceholderReason) {
        self.push(Presented::Placeholder { item_id, reason });
    }

    fn present_updating(&self, item_id: ItemId) {
        self.push(Presented::Updating(item_id));
    }

    fn queue_drained(&self) {
        self.push(Presented::Drained);
    }
}

pub fn badge(name: &str, base_level: u32, is_foil: bool) -> EnrichmentRecord {
    EnrichmentRecord {
        name: name.to_string(),
        image_ref: format!("{}.png", name.to_lowercase().replace(' ', "_")),
        scarcity: "1000".to_string(),
        base_level,
        is_foil,
        first_completion: None,
    }
}

/// Cache store over a fresh in-memory database
pub async fn memory_store() -> CacheStore {
    let pool = sbe_common::db::init_memory_database()
        .await
        .expect("Failed to create in-memory database");
    CacheStore::new(pool)
}

/// Fully wired pipeline around a scripted source
pub struct Harness {
    pub source: Arc<ScriptedSource>,
    pub presenter: Arc<RecordingPresenter>,
    pub store: CacheStore,
    pub queue: FetchQueue,
    pub orchestrator: Orchestrator,
}

impl Harness {
    pub fn new(source: ScriptedSource, store: CacheStore, policy: CachePolicy) -> Self {
        Self::with_delays(source, store, policy, FetchDelays::none())
    }

    pub fn with_delays(
        source: ScriptedSource,
        store: CacheStore,
        policy: CachePolicy,
        delays: FetchDelays,
    ) -> Self {
        let source = Arc::new(source);
        let presenter = Arc::new(RecordingPresenter::new());

        let queue = FetchQueue::new(
            DataFetcher::new(source.clone()),
            store.clone(),
            presenter.clone(),
            delays,
        );
        let orchestrator = Orchestrator::new(queue.clone(), store.clone(), policy, presenter.clone());

        Self {
            source,
            presenter,
            store,
            queue,
            orchestrator,
        }
    }
}
