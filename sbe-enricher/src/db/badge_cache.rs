//! Badge cache store
//!
//! One row per item id in `badge_cache`. Every public operation is total:
//! storage failures degrade to a cache miss (`get`) or to `false`
//! (`put`/`remove`) and are logged, never returned.

use crate::models::{CacheEntry, CraftedInfo, EnrichmentRecord, ItemId};
use sbe_common::time::{from_millis, to_millis};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Cache store failures (logged, never surfaced to callers)
#[derive(Debug, Error)]
pub enum CacheError {
    /// Open/read/write failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Running without a database
    #[error("Cache storage unavailable")]
    Unavailable,

    /// Stored row exists but cannot be decoded into a well-formed entry
    #[error("Invalid cache entry: {0}")]
    InvalidEntry(String),
}

type CacheRow = (i64, i64, String, String, String, i64);

/// Durable keyed storage for cache entries
#[derive(Clone)]
pub struct CacheStore {
    pool: Option<SqlitePool>,
}

impl CacheStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool: Some(pool) }
    }

    /// Store used when the database could not be opened
    pub fn disabled() -> Self {
        warn!("Cache storage disabled; every lookup is a miss and results are not persisted");
        Self { pool: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    /// Cached entry for an item, or None when absent, unreadable or malformed
    pub async fn get(&self, item_id: ItemId) -> Option<CacheEntry> {
        match self.try_get(item_id).await {
            Ok(entry) => entry,
            Err(CacheError::Unavailable) => None,
            Err(e @ CacheError::InvalidEntry(_)) => {
                warn!(item_id, error = %e, "Ignoring malformed cache entry");
                None
            }
            Err(e) => {
                error!(item_id, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Upsert the entry under its item id; false if it could not be persisted
    pub async fn put(&self, entry: &CacheEntry) -> bool {
        match self.try_put(entry).await {
            Ok(()) => true,
            Err(CacheError::Unavailable) => false,
            Err(e) => {
                error!(item_id = entry.item_id, error = %e, "Cache write failed");
                false
            }
        }
    }

    /// Delete the entry if present; false only on storage failure
    pub async fn remove(&self, item_id: ItemId) -> bool {
        match self.try_remove(item_id).await {
            Ok(removed) => {
                info!(item_id, removed, "Removed cache entry");
                true
            }
            Err(CacheError::Unavailable) => false,
            Err(e) => {
                error!(item_id, error = %e, "Cache delete failed");
                false
            }
        }
    }

    fn pool(&self) -> Result<&SqlitePool, CacheError> {
        self.pool.as_ref().ok_or(CacheError::Unavailable)
    }

    async fn try_get(&self, item_id: ItemId) -> Result<Option<CacheEntry>, CacheError> {
        let row: Option<CacheRow> = sqlx::query_as(
            r#"
            SELECT item_id, created_at_ms, enrichment_records, crafted_normal, crafted_foil, degraded
            FROM badge_cache
            WHERE item_id = ?
            "#,
        )
        .bind(i64::from(item_id))
        .fetch_optional(self.pool()?)
        .await?;

        row.map(decode_row).transpose()
    }

    async fn try_put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let records = encode_json(&entry.enrichment_records)?;
        let crafted_normal = encode_json(&entry.crafted_normal)?;
        let crafted_foil = encode_json(&entry.crafted_foil)?;

        sqlx::query(
            r#"
            INSERT INTO badge_cache (item_id, created_at_ms, enrichment_records, crafted_normal, crafted_foil, degraded)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(item_id) DO UPDATE SET
                created_at_ms = excluded.created_at_ms,
                enrichment_records = excluded.enrichment_records,
                crafted_normal = excluded.crafted_normal,
                crafted_foil = excluded.crafted_foil,
                degraded = excluded.degraded
            "#,
        )
        .bind(i64::from(entry.item_id))
        .bind(to_millis(entry.created_at))
        .bind(records)
        .bind(crafted_normal)
        .bind(crafted_foil)
        .bind(entry.degraded)
        .execute(self.pool()?)
        .await?;

        debug!(
            item_id = entry.item_id,
            records = entry.enrichment_records.len(),
            degraded = entry.degraded,
            "Cache entry stored"
        );

        Ok(())
    }

    async fn try_remove(&self, item_id: ItemId) -> Result<bool, CacheError> {
        let result = sqlx::query("DELETE FROM badge_cache WHERE item_id = ?")
            .bind(i64::from(item_id))
            .execute(self.pool()?)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, CacheError> {
    serde_json::to_string(value).map_err(|e| CacheError::InvalidEntry(format!("encode: {}", e)))
}

fn decode_row(row: CacheRow) -> Result<CacheEntry, CacheError> {
    let (item_id, created_at_ms, records, crafted_normal, crafted_foil, degraded) = row;

    let item_id = ItemId::try_from(item_id)
        .map_err(|_| CacheError::InvalidEntry(format!("item id out of range: {}", item_id)))?;

    let created_at = from_millis(created_at_ms)
        .ok_or_else(|| CacheError::InvalidEntry(format!("bad timestamp: {}", created_at_ms)))?;

    let enrichment_records: Vec<EnrichmentRecord> = serde_json::from_str(&records)
        .map_err(|e| CacheError::InvalidEntry(format!("enrichment_records: {}", e)))?;

    let crafted_normal: CraftedInfo = serde_json::from_str(&crafted_normal)
        .map_err(|e| CacheError::InvalidEntry(format!("crafted_normal: {}", e)))?;

    let crafted_foil: CraftedInfo = serde_json::from_str(&crafted_foil)
        .map_err(|e| CacheError::InvalidEntry(format!("crafted_foil: {}", e)))?;

    let entry = CacheEntry {
        item_id,
        created_at,
        enrichment_records,
        crafted_normal,
        crafted_foil,
        degraded: degraded != 0,
    };

    if !entry.is_well_formed() {
        return Err(CacheError::InvalidEntry(
            "crafted info disagrees with its level".to_string(),
        ));
    }

    Ok(entry)
}
