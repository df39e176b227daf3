//! Steamsets API client (enrichment call)
//!
//! `POST app.listBadges` with `{"appId": <id>}` and a bearer key.
//! Response: `{"badges": [{name, isFoil, baseLevel, scarcity, badgeImage, firstCompletion?}]}`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use super::badge_source::{build_http_client, FetchError};
use crate::models::{EnrichmentRecord, ItemId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SteamsetsBadge {
    name: String,
    is_foil: bool,
    base_level: u32,
    scarcity: Value,
    badge_image: String,
    #[serde(default)]
    first_completion: Option<String>,
}

impl From<SteamsetsBadge> for EnrichmentRecord {
    fn from(badge: SteamsetsBadge) -> Self {
        EnrichmentRecord {
            name: badge.name,
            image_ref: badge.badge_image,
            scarcity: scalar_to_string(&badge.scarcity),
            base_level: badge.base_level,
            is_foil: badge.is_foil,
            first_completion: badge.first_completion.as_deref().and_then(parse_timestamp),
        }
    }
}

/// Steamsets API client
pub struct SteamsetsClient {
    http_client: reqwest::Client,
    url: String,
    api_key: String,
}

impl SteamsetsClient {
    pub fn new(url: String, api_key: String, timeout: Option<Duration>) -> Result<Self, FetchError> {
        Ok(Self {
            http_client: build_http_client(timeout)?,
            url,
            api_key,
        })
    }

    /// List every badge level for an item
    pub async fn list_badges(&self, item_id: ItemId) -> Result<Vec<EnrichmentRecord>, FetchError> {
        tracing::debug!(item_id, url = %self.url, "Querying Steamsets API");

        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "appId": item_id }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FetchError::Api(status.as_u16(), body));
        }

        let records = parse_badge_list(&body)?;

        tracing::info!(item_id, badges = records.len(), "Fetched Steamsets badge data");

        Ok(records)
    }
}

/// Parse a `listBadges` response body
///
/// The whole list is rejected if it is missing or any element is malformed.
pub fn parse_badge_list(body: &str) -> Result<Vec<EnrichmentRecord>, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let badges = match value.get("badges") {
        Some(badges @ Value::Array(_)) => badges.clone(),
        _ => {
            return Err(FetchError::UnexpectedShape(
                "response does not contain a 'badges' array".to_string(),
            ))
        }
    };

    let badges: Vec<SteamsetsBadge> =
        serde_json::from_value(badges).map_err(|e| FetchError::UnexpectedShape(e.to_string()))?;

    Ok(badges.into_iter().map(EnrichmentRecord::from).collect())
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
