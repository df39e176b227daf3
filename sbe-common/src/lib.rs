//! # SBE Common Library
//!
//! Shared code for the SBE badge enrichment service:
//! - Error and result types
//! - TOML bootstrap configuration and root folder resolution
//! - SQLite database initialization (cache schema)
//! - Event types and the broadcast `EventBus`
//! - SSE helpers
//! - Timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
