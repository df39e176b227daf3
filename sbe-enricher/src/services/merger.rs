//! Record merge and crafted highlight
//!
//! Order: non-foil records by ascending level, then foil records by ascending
//! level (stable). A record is highlighted when the crafted info of its foil
//! class is crafted at exactly the record's level.

use crate::models::{AnnotatedRecord, CacheEntry, CraftedInfo, EnrichmentRecord};

pub fn combine(
    records: &[EnrichmentRecord],
    crafted_normal: &CraftedInfo,
    crafted_foil: &CraftedInfo,
) -> Vec<AnnotatedRecord> {
    let mut ordered = records.to_vec();
    ordered.sort_by_key(|record| (record.is_foil, record.base_level));

    ordered
        .into_iter()
        .map(|record| {
            let highlighted = is_highlighted(&record, crafted_normal, crafted_foil);
            AnnotatedRecord { record, highlighted }
        })
        .collect()
}

/// Merged view of a cache entry
pub fn combine_entry(entry: &CacheEntry) -> Vec<AnnotatedRecord> {
    combine(&entry.enrichment_records, &entry.crafted_normal, &entry.crafted_foil)
}

pub fn is_highlighted(
    record: &EnrichmentRecord,
    crafted_normal: &CraftedInfo,
    crafted_foil: &CraftedInfo,
) -> bool {
    let crafted = if record.is_foil { crafted_foil } else { crafted_normal };
    crafted.is_crafted && crafted.crafted_level == record.base_level
}
