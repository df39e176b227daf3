//! Core data model
//!
//! Item ids, fetched badge records, crafted status, cache entries and the
//! highlight-annotated records produced by the merger.

use chrono::{DateTime, Utc};
use sbe_common::events::BadgeViewInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier of an enriched item (Steam app id)
pub type ItemId = u32;

/// Shown when a badge has no (or an unreadable) first completion date
pub const DATE_UNAVAILABLE: &str = "Date unavailable";

/// One badge level as reported by the enrichment service
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    pub name: String,
    /// Image file name relative to the item's CDN folder
    pub image_ref: String,
    pub scarcity: String,
    pub base_level: u32,
    pub is_foil: bool,
    #[serde(default)]
    pub first_completion: Option<DateTime<Utc>>,
}

/// Badge variant queried by the crafted-status call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Normal,
    Foil,
}

impl Variant {
    pub fn is_foil(&self) -> bool {
        matches!(self, Variant::Foil)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Normal => write!(f, "normal"),
            Variant::Foil => write!(f, "foil"),
        }
    }
}

/// Crafted level of one badge variant
///
/// Invariant: `is_crafted == (crafted_level > 0)`. Build through
/// [`CraftedInfo::from_level`] to keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftedInfo {
    pub crafted_level: u32,
    pub is_crafted: bool,
}

impl CraftedInfo {
    pub fn from_level(crafted_level: u32) -> Self {
        Self {
            crafted_level,
            is_crafted: crafted_level > 0,
        }
    }

    /// Nothing crafted (also the degraded default)
    pub fn none() -> Self {
        Self::from_level(0)
    }

    pub fn is_consistent(&self) -> bool {
        self.is_crafted == (self.crafted_level > 0)
    }
}

/// Merged result of one fetch cycle, persisted per item
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
    pub enrichment_records: Vec<EnrichmentRecord>,
    pub crafted_normal: CraftedInfo,
    pub crafted_foil: CraftedInfo,
    /// At least one remote call failed while producing this entry
    pub degraded: bool,
}

impl CacheEntry {
    /// Entry stamped with the current time
    pub fn new(
        item_id: ItemId,
        enrichment_records: Vec<EnrichmentRecord>,
        crafted_normal: CraftedInfo,
        crafted_foil: CraftedInfo,
        degraded: bool,
    ) -> Self {
        Self {
            item_id,
            created_at: Utc::now(),
            enrichment_records,
            crafted_normal,
            crafted_foil,
            degraded,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Structural checks that typed decoding cannot express
    pub fn is_well_formed(&self) -> bool {
        self.crafted_normal.is_consistent() && self.crafted_foil.is_consistent()
    }
}

/// A record with its crafted highlight, in display order
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    pub record: EnrichmentRecord,
    pub highlighted: bool,
}

impl AnnotatedRecord {
    /// `<cdn>/<item id>/<image ref>`
    pub fn image_url(&self, image_cdn_url: &str, item_id: ItemId) -> String {
        format!(
            "{}/{}/{}",
            image_cdn_url.trim_end_matches('/'),
            item_id,
            self.record.image_ref
        )
    }

    /// e.g. "Mar 5, 2021, 4:07 PM" (UTC)
    pub fn completion_display(&self) -> String {
        match self.record.first_completion {
            Some(ts) => ts.format("%b %-d, %Y, %-I:%M %p").to_string(),
            None => DATE_UNAVAILABLE.to_string(),
        }
    }

    pub fn level_label(&self) -> String {
        if self.record.is_foil {
            format!("Level: {} (Foil)", self.record.base_level)
        } else {
            format!("Level: {}", self.record.base_level)
        }
    }

    pub fn to_view_info(&self, image_cdn_url: &str, item_id: ItemId) -> BadgeViewInfo {
        BadgeViewInfo {
            name: self.record.name.clone(),
            image_url: self.image_url(image_cdn_url, item_id),
            scarcity: self.record.scarcity.clone(),
            level: self.record.base_level,
            is_foil: self.record.is_foil,
            first_completion: self.completion_display(),
            level_label: self.level_label(),
            highlighted: self.highlighted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn annotated(is_foil: bool, first_completion: Option<DateTime<Utc>>) -> AnnotatedRecord {
        AnnotatedRecord {
            record: EnrichmentRecord {
                name: "Summer Sale".to_string(),
                image_ref: "abc123.png".to_string(),
                scarcity: "1024".to_string(),
                base_level: 3,
                is_foil,
                first_completion,
            },
            highlighted: false,
        }
    }

    #[test]
    fn test_crafted_info_invariant() {
        assert_eq!(CraftedInfo::from_level(0), CraftedInfo::none());
        assert!(!CraftedInfo::none().is_crafted);
        assert!(CraftedInfo::from_level(5).is_crafted);
        assert!(CraftedInfo::from_level(5).is_consistent());

        let broken = CraftedInfo {
            crafted_level: 2,
            is_crafted: false,
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_crafted_info_wire_names() {
        let json = serde_json::to_value(CraftedInfo::from_level(3)).unwrap();
        assert_eq!(json["craftedLevel"], 3);
        assert_eq!(json["isCrafted"], true);
    }

    #[test]
    fn test_image_url_and_labels() {
        let normal = annotated(false, None);
        assert_eq!(
            normal.image_url("https://cdn.example/items/", 730),
            "https://cdn.example/items/730/abc123.png"
        );
        assert_eq!(normal.level_label(), "Level: 3");
        assert_eq!(normal.completion_display(), DATE_UNAVAILABLE);

        let foil = annotated(true, None);
        assert_eq!(foil.level_label(), "Level: 3 (Foil)");
    }

    #[test]
    fn test_completion_display_format() {
        let ts = Utc.with_ymd_and_hms(2021, 3, 5, 16, 7, 0).unwrap();
        assert_eq!(annotated(false, Some(ts)).completion_display(), "Mar 5, 2021, 4:07 PM");
    }

    #[test]
    fn test_entry_well_formed() {
        let entry = CacheEntry::new(1, vec![], CraftedInfo::none(), CraftedInfo::from_level(1), false);
        assert!(entry.is_well_formed());

        let mut broken = entry.clone();
        broken.crafted_foil.is_crafted = false;
        assert!(!broken.is_well_formed());
    }
}
