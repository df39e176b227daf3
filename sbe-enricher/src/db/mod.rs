//! Database access for sbe-enricher

pub mod badge_cache;

pub use badge_cache::{CacheError, CacheStore};

use sbe_common::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the cache database in the root folder, creating it if needed
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    tracing::debug!("Connecting to database: {}", db_path.display());
    sbe_common::db::init_database(db_path).await
}

/// Open the cache store, falling back to a disabled store on failure
pub async fn open_cache_store(db_path: &Path) -> CacheStore {
    match init_database_pool(db_path).await {
        Ok(pool) => CacheStore::new(pool),
        Err(e) => {
            tracing::error!(
                path = %db_path.display(),
                error = %e,
                "Failed to open cache database; caching will not be available"
            );
            CacheStore::disabled()
        }
    }
}
