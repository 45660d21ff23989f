//! Single-slot, in-memory cache for the fetched sheet.
//!
//! One entry at most. It is replaced wholesale on every successful fetch,
//! never mutated in place, and expires a fixed duration after it was set.
//!
//! Writes go through a tokio `RwLock`, so concurrent refreshes serialize.
//! A write carrying an older `fetched_at` than the stored entry is dropped,
//! which makes the slot last-writer-wins by fetch time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::table::SheetTable;

/// The cached sheet and the row count observed when it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub rows: SheetTable,
    pub sheet_row_count: u32,
    pub fetched_at: DateTime<Utc>,
}

struct Slot {
    entry: CacheEntry,
    expires_at: DateTime<Utc>,
}

impl Slot {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide sheet cache, shared by reference between request handlers.
#[derive(Clone, Default)]
pub struct SheetCache {
    slot: Arc<RwLock<Option<Slot>>>,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry, or None when absent or expired at `now`.
    pub async fn get(&self, now: DateTime<Utc>) -> Option<CacheEntry> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(s) if !s.is_expired(now) => Some(s.entry.clone()),
            Some(_) => {
                tracing::debug!("sheet cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Store `entry`, expiring `ttl` after its `fetched_at`.
    ///
    /// Returns false when a fresher entry is already stored and the write was dropped.
    pub async fn set(&self, entry: CacheEntry, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = entry.fetched_at.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut slot = self.slot.write().await;
        if let Some(current) = slot.as_ref()
            && current.entry.fetched_at > entry.fetched_at
        {
            tracing::debug!(
                stored = %current.entry.fetched_at,
                incoming = %entry.fetched_at,
                "dropping stale sheet cache write"
            );
            return false;
        }
        *slot = Some(Slot { entry, expires_at });
        true
    }

    /// Expiry instant of the stored entry, if any.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.slot.read().await.as_ref().map(|s| s.expires_at)
    }

    /// Drop the stored entry.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

impl std::fmt::Debug for SheetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::SheetRow;
    use chrono::TimeZone;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap()
    }

    fn entry(sku: &str, count: u32, fetched_at: DateTime<Utc>) -> CacheEntry {
        let rows = SheetTable::from_rows(vec![
            ["SKU", "Title"].into_iter().collect::<SheetRow>(),
            [sku, "Widget"].into_iter().collect::<SheetRow>(),
        ]);
        CacheEntry { rows, sheet_row_count: count, fetched_at }
    }

    #[tokio::test]
    async fn test_get_empty() {
        let cache = SheetCache::new();
        assert!(cache.get(at(9)).await.is_none());
        assert!(cache.expires_at().await.is_none());
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = SheetCache::new();
        assert!(cache.set(entry("A1", 100, at(9)), DAY).await);

        let got = cache.get(at(10)).await.unwrap();
        assert_eq!(got.sheet_row_count, 100);
        assert_eq!(got.rows.rows[0].cell(0), "A1");
        assert_eq!(cache.expires_at().await, Some(at(9) + chrono::Duration::days(1)));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = SheetCache::new();
        cache.set(entry("A1", 100, at(9)), DAY).await;

        let just_before = at(9) + chrono::Duration::days(1) - chrono::Duration::seconds(1);
        assert!(cache.get(just_before).await.is_some());
        assert!(cache.get(at(9) + chrono::Duration::days(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_newer_write_replaces() {
        let cache = SheetCache::new();
        cache.set(entry("A1", 100, at(9)), DAY).await;
        assert!(cache.set(entry("B2", 120, at(10)), DAY).await);

        let got = cache.get(at(11)).await.unwrap();
        assert_eq!(got.sheet_row_count, 120);
        assert_eq!(got.rows.rows[0].cell(0), "B2");
    }

    #[tokio::test]
    async fn test_stale_write_is_dropped() {
        let cache = SheetCache::new();
        cache.set(entry("B2", 120, at(10)), DAY).await;
        assert!(!cache.set(entry("A1", 100, at(9)), DAY).await);

        let got = cache.get(at(11)).await.unwrap();
        assert_eq!(got.sheet_row_count, 120);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = SheetCache::new();
        cache.set(entry("A1", 100, at(9)), DAY).await;
        cache.invalidate().await;
        assert!(cache.get(at(9)).await.is_none());
    }

    #[tokio::test]
    async fn test_clones_share_slot() {
        let cache = SheetCache::new();
        let other = cache.clone();
        cache.set(entry("A1", 7, at(9)), DAY).await;
        assert_eq!(other.get(at(9)).await.map(|e| e.sheet_row_count), Some(7));
    }
}
