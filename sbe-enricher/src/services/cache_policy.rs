//! Cache validity and soft-refresh policy
//!
//! An entry is valid while `now - created_at < ttl` (the boundary itself is
//! invalid) and soft-stale once `now - created_at > ttl * soft_refresh_fraction`.
//! Degraded entries are measured against their own TTL, which defaults to the
//! regular one.

use crate::models::CacheEntry;
use chrono::{DateTime, Utc};
use sbe_common::config::EnricherSettings;
use std::time::Duration;

const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_SOFT_REFRESH_FRACTION: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicy {
    ttl: Duration,
    degraded_ttl: Duration,
    soft_refresh_fraction: f64,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CachePolicy {
    /// Policy with the given TTL for all entries and a 0.5 refresh fraction
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            degraded_ttl: ttl,
            soft_refresh_fraction: DEFAULT_SOFT_REFRESH_FRACTION,
        }
    }

    pub fn from_settings(settings: &EnricherSettings) -> Self {
        Self {
            ttl: settings.ttl(),
            degraded_ttl: settings.degraded_ttl(),
            soft_refresh_fraction: settings.soft_refresh_fraction,
        }
    }

    pub fn with_degraded_ttl(mut self, degraded_ttl: Duration) -> Self {
        self.degraded_ttl = degraded_ttl;
        self
    }

    /// Clamped to (0, 1]
    pub fn with_soft_refresh_fraction(mut self, fraction: f64) -> Self {
        self.soft_refresh_fraction = if fraction > 0.0 { fraction.min(1.0) } else { DEFAULT_SOFT_REFRESH_FRACTION };
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn degraded_ttl(&self) -> Duration {
        self.degraded_ttl
    }

    /// TTL that applies to this entry
    pub fn ttl_for(&self, entry: &CacheEntry) -> Duration {
        if entry.degraded {
            self.degraded_ttl
        } else {
            self.ttl
        }
    }

    pub fn is_valid(&self, entry: &CacheEntry) -> bool {
        self.is_valid_at(entry, Utc::now())
    }

    pub fn is_valid_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        entry.is_well_formed() && age_millis(entry, now) < duration_millis(self.ttl_for(entry))
    }

    pub fn is_soft_stale(&self, entry: &CacheEntry) -> bool {
        self.is_soft_stale_at(entry, Utc::now())
    }

    pub fn is_soft_stale_at(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        let threshold = duration_millis(self.ttl_for(entry)) as f64 * self.soft_refresh_fraction;
        age_millis(entry, now) as f64 > threshold
    }
}

fn age_millis(entry: &CacheEntry, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(entry.created_at).num_milliseconds()
}

fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CraftedInfo;
    use chrono::TimeZone;

    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn entry_aged(now: DateTime<Utc>, age_ms: i64, degraded: bool) -> CacheEntry {
        CacheEntry::new(730, vec![], CraftedInfo::none(), CraftedInfo::none(), degraded)
            .with_created_at(now - chrono::Duration::milliseconds(age_ms))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_ttl_is_seven_days() {
        assert_eq!(CachePolicy::default().ttl(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_valid_just_below_ttl() {
        let policy = CachePolicy::default();
        assert!(policy.is_valid_at(&entry_aged(now(), 7 * DAY - 1, false), now()));
    }

    #[test]
    fn test_invalid_at_exact_ttl_boundary() {
        let policy = CachePolicy::default();
        assert!(!policy.is_valid_at(&entry_aged(now(), 7 * DAY, false), now()));
        assert!(!policy.is_valid_at(&entry_aged(now(), 7 * DAY + 1, false), now()));
    }

    #[test]
    fn test_soft_stale_strictly_after_half_ttl() {
        let policy = CachePolicy::default();
        assert!(!policy.is_soft_stale_at(&entry_aged(now(), 3 * DAY, false), now()));
        assert!(!policy.is_soft_stale_at(&entry_aged(now(), 7 * DAY / 2, false), now()));
        assert!(policy.is_soft_stale_at(&entry_aged(now(), 7 * DAY / 2 + 1, false), now()));
        assert!(policy.is_soft_stale_at(&entry_aged(now(), 5 * DAY, false), now()));
    }

    #[test]
    fn test_fresh_entry_is_valid_and_not_stale() {
        let policy = CachePolicy::default();
        let entry = entry_aged(now(), 0, false);
        assert!(policy.is_valid_at(&entry, now()));
        assert!(!policy.is_soft_stale_at(&entry, now()));
    }

    #[test]
    fn test_degraded_entries_use_their_own_ttl() {
        let policy = CachePolicy::default().with_degraded_ttl(Duration::from_secs(60 * 60));
        let degraded = entry_aged(now(), 2 * 60 * 60 * 1000, true);
        let healthy = entry_aged(now(), 2 * 60 * 60 * 1000, false);

        assert!(!policy.is_valid_at(&degraded, now()));
        assert!(policy.is_valid_at(&healthy, now()));
    }

    #[test]
    fn test_degraded_ttl_defaults_to_ttl() {
        let policy = CachePolicy::new(Duration::from_secs(100));
        assert_eq!(policy.degraded_ttl(), Duration::from_secs(100));
        assert!(policy.is_valid_at(&entry_aged(now(), 99_000, true), now()));
    }

    #[test]
    fn test_malformed_entry_is_invalid() {
        let policy = CachePolicy::default();
        let mut entry = entry_aged(now(), 0, false);
        entry.crafted_normal.crafted_level = 4;
        assert!(!policy.is_valid_at(&entry, now()));
    }

    #[test]
    fn test_custom_fraction_and_settings() {
        let settings = EnricherSettings {
            ttl_secs: 1000,
            soft_refresh_fraction: 0.25,
            ..Default::default()
        };
        let policy = CachePolicy::from_settings(&settings);
        assert!(policy.is_soft_stale_at(&entry_aged(now(), 250_001, false), now()));
        assert!(!policy.is_soft_stale_at(&entry_aged(now(), 250_000, false), now()));

        let clamped = CachePolicy::default().with_soft_refresh_fraction(3.0);
        assert!(!clamped.is_soft_stale_at(&entry_aged(now(), 7 * DAY - 1, false), now()));
    }
}
