//! Remote badge data sources
//!
//! `BadgeSource` is the seam between the fetch pipeline and the two remote
//! services. Each operation returns its payload or a typed `FetchError`;
//! turning failures into defaults is the `DataFetcher`'s job.

use async_trait::async_trait;
use sbe_common::config::RemoteSettings;
use std::time::Duration;
use thiserror::Error;

use super::badge_info_client::BadgeInfoClient;
use super::steamsets_client::SteamsetsClient;
use crate::models::{CraftedInfo, EnrichmentRecord, ItemId, Variant};

/// Remote call failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Valid JSON without the expected structure
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
pub trait BadgeSource: Send + Sync {
    /// Enrichment call: every badge level known for the item
    async fn list_badges(&self, item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError>;

    /// Crafted-status call for one variant
    async fn crafted_info(&self, item_id: ItemId, variant: Variant) -> Result<CraftedInfo, FetchError>;
}

/// Production source backed by the Steamsets API and Steam's badge info endpoint
pub struct HttpBadgeSource {
    steamsets: SteamsetsClient,
    badge_info: BadgeInfoClient,
}

impl HttpBadgeSource {
    pub fn new(steamsets: SteamsetsClient, badge_info: BadgeInfoClient) -> Self {
        Self {
            steamsets,
            badge_info,
        }
    }

    pub fn from_settings(
        remote: &RemoteSettings,
        api_key: String,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        Ok(Self::new(
            SteamsetsClient::new(remote.steamsets_url.clone(), api_key, timeout)?,
            BadgeInfoClient::new(remote.badge_info_url.clone(), timeout)?,
        ))
    }
}

#[async_trait]
impl BadgeSource for HttpBadgeSource {
    async fn list_badges(&self, item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError> {
        self.steamsets.list_badges(item_id).await
    }

    async fn crafted_info(&self, item_id: ItemId, variant: Variant) -> Result<CraftedInfo, FetchError> {
        self.badge_info.crafted_info(item_id, variant).await
    }
}

/// Shared client builder; no timeout unless configured
pub(crate) fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, FetchError> {
    let mut builder = reqwest::Client::builder().user_agent(super::USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| FetchError::Network(e.to_string()))
}
