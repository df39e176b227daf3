//! Total remote reads
//!
//! Wraps a `BadgeSource` so that every call returns a value: failures are
//! logged and replaced by the documented default (empty list, crafted
//! level 0). `Fetched::degraded` records that the default was used.

use std::sync::Arc;
use tracing::warn;

use super::badge_source::BadgeSource;
use crate::models::{CraftedInfo, EnrichmentRecord, ItemId, Variant};

/// A remote read result that may have been replaced by its default
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Fetched<T> {
    fn ok(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    fn fallback(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn BadgeSource>,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn BadgeSource>) -> Self {
        Self { source }
    }

    /// Enrichment records, or an empty list on any failure
    pub async fn fetch_enrichment(&self, item_id: ItemId) -> Fetched<Vec<EnrichmentRecord>> {
        match self.source.list_badges(item_id).await {
            Ok(records) => Fetched::ok(records),
            Err(e) => {
                warn!(item_id, error = %e, "Enrichment call failed, using empty badge list");
                Fetched::fallback(Vec::new())
            }
        }
    }

    /// Crafted status, or level 0 on any failure
    pub async fn fetch_crafted_info(&self, item_id: ItemId, variant: Variant) -> Fetched<CraftedInfo> {
        match self.source.crafted_info(item_id, variant).await {
            Ok(info) => Fetched::ok(info),
            Err(e) => {
                warn!(item_id, variant = %variant, error = %e, "Crafted-status call failed, using level 0");
                Fetched::fallback(CraftedInfo::none())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::badge_source::FetchError;
    use async_trait::async_trait;

    struct FailingSource;

    #[async_trait]
    impl BadgeSource for FailingSource {
        async fn list_badges(&self, _item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError> {
            Err(FetchError::Network("connection refused".to_string()))
        }

        async fn crafted_info(&self, _item_id: ItemId, _variant: Variant) -> Result<CraftedInfo, FetchError> {
            Err(FetchError::Parse("unexpected token".to_string()))
        }
    }

    struct CraftedSource;

    #[async_trait]
    impl BadgeSource for CraftedSource {
        async fn list_badges(&self, _item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError> {
            Ok(Vec::new())
        }

        async fn crafted_info(&self, _item_id: ItemId, variant: Variant) -> Result<CraftedInfo, FetchError> {
            Ok(CraftedInfo::from_level(if variant.is_foil() { 1 } else { 4 }))
        }
    }

    #[tokio::test]
    async fn test_failures_yield_defaults() {
        let fetcher = DataFetcher::new(Arc::new(FailingSource));

        let records = fetcher.fetch_enrichment(730).await;
        assert!(records.value.is_empty());
        assert!(records.degraded);

        let crafted = fetcher.fetch_crafted_info(730, Variant::Foil).await;
        assert_eq!(crafted.value, CraftedInfo::none());
        assert!(crafted.degraded);
    }

    #[tokio::test]
    async fn test_success_is_not_degraded() {
        let fetcher = DataFetcher::new(Arc::new(CraftedSource));

        let records = fetcher.fetch_enrichment(730).await;
        assert!(records.value.is_empty());
        assert!(!records.degraded);

        let normal = fetcher.fetch_crafted_info(730, Variant::Normal).await;
        assert_eq!(normal.value, CraftedInfo::from_level(4));
        assert!(!normal.degraded);
    }
}
