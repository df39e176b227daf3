//! Steam badge info client (crafted-status call)
//!
//! `GET <base><id>` for the normal badge, `GET <base><id>?border=1` for foil.
//! Response: `{"badgedata": {"level": <number>}}`. A missing, non-integer or
//! non-positive level means nothing is crafted.

use serde_json::Value;
use std::time::Duration;

use super::badge_source::{build_http_client, FetchError};
use crate::models::{CraftedInfo, ItemId, Variant};

pub struct BadgeInfoClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl BadgeInfoClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            base_url,
        })
    }

    pub fn badge_info_url(&self, item_id: ItemId, variant: Variant) -> String {
        match variant {
            Variant::Normal => format!("{}{}", self.base_url, item_id),
            Variant::Foil => format!("{}{}?border=1", self.base_url, item_id),
        }
    }

    pub async fn crafted_info(&self, item_id: ItemId, variant: Variant) -> Result<CraftedInfo, FetchError> {
        let url = self.badge_info_url(item_id, variant);

        let response = self.http_client.get(&url).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16(), body));
        }

        let info = parse_badge_info(&body)?;

        tracing::debug!(
            item_id,
            variant = %variant,
            crafted_level = info.crafted_level,
            "Fetched crafted badge info"
        );

        Ok(info)
    }
}

/// Parse an `ajaxgetbadgeinfo` response body
pub fn parse_badge_info(body: &str) -> Result<CraftedInfo, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let level = value
        .get("badgedata")
        .and_then(|data| data.get("level"))
        .and_then(whole_level)
        .unwrap_or(0);

    Ok(CraftedInfo::from_level(level))
}

/// Integral levels only; `2.0` is level 2, `2.5` matches no badge
fn whole_level(level: &Value) -> Option<u32> {
    if let Some(level) = level.as_u64() {
        return Some(u32::try_from(level).unwrap_or(u32::MAX));
    }
    level
        .as_f64()
        .filter(|level| *level > 0.0 && level.fract() == 0.0)
        .map(|level| level.min(f64::from(u32::MAX)) as u32)
}
