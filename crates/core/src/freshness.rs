//! Cache freshness and revalidation policy.
//!
//! ### Decision table
//! - Quiet hours and a cached entry: serve it without any API call.
//! - Cached entry outside quiet hours: fetch the row count (metadata only)
//!   and serve the cache if it matches the count stored with the entry.
//! - Otherwise: full fetch, truncate at the first blank column A, and cache
//!   the result together with a freshly observed row count.
//!
//! Fetch failures never escape `resolve`; they come back as a banner message
//! next to an empty table. A failed row-count lookup reads as `0`; a `0` on
//! either side of the comparison never counts as a match, so it forces a refetch.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};

use crate::cache::{CacheEntry, SheetCache};
use crate::config::AppConfig;
use crate::filter::truncate_at_blank;
use crate::source::SheetSource;
use crate::table::SheetTable;
use crate::Error;

const NO_DATA: &str = "Google Sheet returned no data.";
const NO_MEANINGFUL_DATA: &str = "No meaningful data found from Google Sheet after filtering by Column A.";

/// Daily window, in a fixed UTC offset, during which the cache is trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    /// First hour of the window (inclusive).
    pub start: u32,
    /// Last hour of the window (exclusive).
    pub end: u32,
    pub offset: FixedOffset,
}

impl QuietHours {
    pub fn new(start: u32, end: u32, offset: FixedOffset) -> Self {
        Self { start, end, offset }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = now.with_timezone(&self.offset).hour();
        hour >= self.start && hour < self.end
    }
}

impl Default for QuietHours {
    /// 00:00 to 08:00 UTC.
    fn default() -> Self {
        Self { start: 0, end: 8, offset: Utc.fix() }
    }
}

/// What the policy will do for a request, before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Quiet hours with a cached entry: serve it unconditionally.
    ServeQuiet,
    /// Cached entry outside quiet hours: confirm it via the row count.
    Revalidate,
    /// No usable entry: full fetch.
    Fetch,
}

/// Where the served table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    QuietCache,
    RevalidatedCache,
    Fetched,
    /// Nothing could be served; `SheetLoad::message` says why.
    Unavailable,
}

/// Result of one resolution: never an error, at worst an empty table and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLoad {
    pub table: SheetTable,
    pub message: Option<String>,
    pub origin: LoadOrigin,
}

impl SheetLoad {
    fn cached(entry: CacheEntry, origin: LoadOrigin) -> Self {
        Self { table: entry.rows, message: None, origin }
    }

    fn unavailable(err: &Error) -> Self {
        Self { table: SheetTable::default(), message: Some(err.user_message()), origin: LoadOrigin::Unavailable }
    }
}

/// Decides between cached, revalidated and refetched sheet data.
#[derive(Debug, Clone)]
pub struct FreshnessPolicy {
    quiet_hours: QuietHours,
    ttl: Duration,
}

impl FreshnessPolicy {
    pub fn new(quiet_hours: QuietHours, ttl: Duration) -> Self {
        Self { quiet_hours, ttl }
    }

    /// Build the policy from loaded configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let offset = FixedOffset::east_opt(config.quiet_hours_utc_offset_minutes * 60).ok_or_else(|| {
            Error::InvalidInput(format!(
                "quiet_hours_utc_offset_minutes out of range: {}",
                config.quiet_hours_utc_offset_minutes
            ))
        })?;
        let quiet_hours = QuietHours::new(config.quiet_hours_start, config.quiet_hours_end, offset);
        Ok(Self::new(quiet_hours, config.cache_ttl()))
    }

    pub fn quiet_hours(&self) -> &QuietHours {
        &self.quiet_hours
    }

    /// Pure decision step, no I/O.
    pub fn decide(&self, now: DateTime<Utc>, cached: Option<&CacheEntry>) -> Decision {
        match cached {
            Some(_) if self.quiet_hours.contains(now) => Decision::ServeQuiet,
            Some(_) => Decision::Revalidate,
            None => Decision::Fetch,
        }
    }

    /// Resolve the table to display at `now`.
    pub async fn resolve(&self, now: DateTime<Utc>, cache: &SheetCache, source: &dyn SheetSource) -> SheetLoad {
        let cached = cache.get(now).await;

        match (self.decide(now, cached.as_ref()), cached) {
            (Decision::ServeQuiet, Some(entry)) => {
                tracing::info!(rows = entry.rows.len(), "quiet hours: serving cached sheet without revalidation");
                return SheetLoad::cached(entry, LoadOrigin::QuietCache);
            }
            (Decision::Revalidate, Some(entry)) => {
                let current = row_count_or_zero(source).await;
                if current != 0 && current == entry.sheet_row_count {
                    tracing::debug!(row_count = current, "row count unchanged, serving cached sheet");
                    return SheetLoad::cached(entry, LoadOrigin::RevalidatedCache);
                }
                tracing::info!(
                    cached = entry.sheet_row_count,
                    current,
                    "row count changed, refetching sheet"
                );
            }
            (Decision::Fetch, _) => {
                if self.quiet_hours.contains(now) {
                    tracing::warn!("cache empty during quiet hours, fetching sheet to populate it");
                }
            }
            _ => {}
        }

        match self.refetch(now, cache, source).await {
            Ok(table) => SheetLoad { table, message: None, origin: LoadOrigin::Fetched },
            Err(err) => {
                match &err {
                    Error::EmptyData(_) => tracing::warn!(error = %err, "sheet returned no usable rows"),
                    _ => tracing::error!(error = %err, "failed to read sheet, displaying empty table"),
                }
                SheetLoad::unavailable(&err)
            }
        }
    }

    /// Full fetch, truncation, and cache write.
    async fn refetch(&self, now: DateTime<Utc>, cache: &SheetCache, source: &dyn SheetSource) -> Result<SheetTable, Error> {
        let raw = source.values().await?;
        if raw.is_empty() {
            return Err(Error::EmptyData(NO_DATA.into()));
        }

        let table = truncate_at_blank(&raw);
        if table.is_empty() {
            return Err(Error::EmptyData(NO_MEANINGFUL_DATA.into()));
        }

        let sheet_row_count = row_count_or_zero(source).await;
        let entry = CacheEntry { rows: table.clone(), sheet_row_count, fetched_at: now };
        if cache.set(entry, self.ttl).await {
            tracing::info!(
                rows = table.len(),
                sheet_row_count,
                ttl_secs = self.ttl.as_secs(),
                "cached sheet data"
            );
        }

        Ok(table)
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(QuietHours::default(), Duration::from_secs(24 * 60 * 60))
    }
}

async fn row_count_or_zero(source: &dyn SheetSource) -> u32 {
    match source.row_count().await {
        Ok(count) => count,
        Err(err) => {
            tracing::error!(error = %err, "row count lookup failed, treating as 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    /// In-memory sheet with call counters.
    struct FakeSheet {
        rows: Mutex<Vec<Vec<Value>>>,
        row_count: AtomicU32,
        fail_values: bool,
        fail_row_count: bool,
        values_calls: AtomicUsize,
        row_count_calls: AtomicUsize,
    }

    impl FakeSheet {
        fn new(rows: Value, row_count: u32) -> Self {
            Self {
                rows: Mutex::new(serde_json::from_value(rows).unwrap()),
                row_count: AtomicU32::new(row_count),
                fail_values: false,
                fail_row_count: false,
                values_calls: AtomicUsize::new(0),
                row_count_calls: AtomicUsize::new(0),
            }
        }

        fn values_calls(&self) -> usize {
            self.values_calls.load(Ordering::SeqCst)
        }

        fn row_count_calls(&self) -> usize {
            self.row_count_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SheetSource for FakeSheet {
        async fn values(&self) -> Result<Vec<Vec<Value>>, Error> {
            self.values_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_values {
                return Err(Error::Fetch("HTTP error: 503".into()));
            }
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn row_count(&self) -> Result<u32, Error> {
            self.row_count_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_row_count {
                return Err(Error::Metadata("sheet not found".into()));
            }
            Ok(self.row_count.load(Ordering::SeqCst))
        }
    }

    fn sheet() -> FakeSheet {
        FakeSheet::new(
            json!([
                ["SKU", "Title", "Price"],
                ["A1", "Widget", "10.00"],
                ["", "", ""],
                ["A2", "Gadget", "5.00"]
            ]),
            1000,
        )
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 30, 0).unwrap()
    }

    const QUIET: u32 = 3;
    const BUSY: u32 = 14;

    #[test]
    fn test_quiet_hours_bounds() {
        let quiet = QuietHours::default();
        assert!(quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()));
        assert!(quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 7, 59, 59).unwrap()));
        assert!(!quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap()));
        assert!(!quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap()));
    }

    #[test]
    fn test_quiet_hours_respect_offset() {
        // 22:00 UTC is 07:00 at +09:00.
        let quiet = QuietHours::new(0, 8, FixedOffset::east_opt(9 * 3600).unwrap());
        assert!(quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 22, 0, 0).unwrap()));
        assert!(!quiet.contains(Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap()));
    }

    #[test]
    fn test_decide() {
        let policy = FreshnessPolicy::default();
        let entry = CacheEntry { rows: SheetTable::default(), sheet_row_count: 1, fetched_at: at(1) };
        assert_eq!(policy.decide(at(QUIET), Some(&entry)), Decision::ServeQuiet);
        assert_eq!(policy.decide(at(BUSY), Some(&entry)), Decision::Revalidate);
        assert_eq!(policy.decide(at(QUIET), None), Decision::Fetch);
        assert_eq!(policy.decide(at(BUSY), None), Decision::Fetch);
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig { quiet_hours_start: 1, quiet_hours_end: 5, quiet_hours_utc_offset_minutes: -300, ..Default::default() };
        let policy = FreshnessPolicy::from_config(&config).unwrap();
        assert_eq!(policy.quiet_hours().start, 1);
        assert_eq!(policy.quiet_hours().end, 5);
        assert_eq!(policy.quiet_hours().offset.local_minus_utc(), -300 * 60);
    }

    #[tokio::test]
    async fn test_cold_fetch_truncates_and_caches() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();

        let load = policy.resolve(at(BUSY), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Fetched);
        assert!(load.message.is_none());
        assert_eq!(load.table.len(), 1);
        assert_eq!(load.table.rows[0].cell(0), "A1");

        let entry = cache.get(at(BUSY)).await.unwrap();
        assert_eq!(entry.sheet_row_count, 1000);
        assert_eq!(entry.fetched_at, at(BUSY));
        assert_eq!(source.values_calls(), 1);
        assert_eq!(source.row_count_calls(), 1);
    }

    #[tokio::test]
    async fn test_quiet_hours_skip_all_calls() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();

        policy.resolve(at(BUSY), &cache, &source).await;
        let next_day = at(QUIET) + chrono::Duration::days(1);

        let first = policy.resolve(next_day, &cache, &source).await;
        let second = policy.resolve(next_day, &cache, &source).await;
        assert_eq!(first.origin, LoadOrigin::QuietCache);
        assert_eq!(second.origin, LoadOrigin::QuietCache);
        assert_eq!(source.values_calls(), 1);
        assert_eq!(source.row_count_calls(), 1);
    }

    #[tokio::test]
    async fn test_quiet_hours_cache_miss_fetches() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();

        let load = policy.resolve(at(QUIET), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Fetched);
        assert_eq!(source.values_calls(), 1);

        let again = policy.resolve(at(QUIET), &cache, &source).await;
        assert_eq!(again.origin, LoadOrigin::QuietCache);
        assert_eq!(source.values_calls(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_row_count_reuses_cache() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();

        policy.resolve(at(BUSY), &cache, &source).await;
        let load = policy.resolve(at(BUSY + 1), &cache, &source).await;

        assert_eq!(load.origin, LoadOrigin::RevalidatedCache);
        assert_eq!(load.table.len(), 1);
        assert_eq!(source.values_calls(), 1);
        assert_eq!(source.row_count_calls(), 2);
    }

    #[tokio::test]
    async fn test_changed_row_count_refetches() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();

        policy.resolve(at(BUSY), &cache, &source).await;

        *source.rows.lock().unwrap() = serde_json::from_value(json!([
            ["SKU", "Title", "Price"],
            ["A1", "Widget", "10.00"],
            ["A2", "Gadget", "5.00"]
        ]))
        .unwrap();
        source.row_count.store(1001, Ordering::SeqCst);

        let load = policy.resolve(at(BUSY + 1), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Fetched);
        assert_eq!(load.table.len(), 2);
        assert_eq!(source.values_calls(), 2);

        let entry = cache.get(at(BUSY + 1)).await.unwrap();
        assert_eq!(entry.sheet_row_count, 1001);
        assert_eq!(entry.fetched_at, at(BUSY + 1));
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let policy = FreshnessPolicy::new(QuietHours::default(), Duration::from_secs(3600));
        let cache = SheetCache::new();
        let source = sheet();

        policy.resolve(at(BUSY), &cache, &source).await;
        let load = policy.resolve(at(BUSY + 2), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Fetched);
        assert_eq!(source.values_calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_response_is_not_cached() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = FakeSheet::new(json!([]), 1000);

        let load = policy.resolve(at(BUSY), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Unavailable);
        assert_eq!(load.message.as_deref(), Some(NO_DATA));
        assert!(load.table.is_empty());
        assert!(cache.get(at(BUSY)).await.is_none());
    }

    #[tokio::test]
    async fn test_blank_first_row_is_not_cached() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = FakeSheet::new(json!([["", "Title"], ["A1", "Widget"]]), 1000);

        let load = policy.resolve(at(BUSY), &cache, &source).await;
        assert_eq!(load.message.as_deref(), Some(NO_MEANINGFUL_DATA));
        assert!(cache.get(at(BUSY)).await.is_none());
        assert_eq!(source.row_count_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_becomes_message() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = FakeSheet { fail_values: true, ..sheet() };

        let load = policy.resolve(at(BUSY), &cache, &source).await;
        assert_eq!(load.origin, LoadOrigin::Unavailable);
        assert_eq!(load.message.as_deref(), Some("Error: HTTP error: 503"));
        assert!(load.table.is_empty());
    }

    #[tokio::test]
    async fn test_metadata_failure_forces_refetch() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = FakeSheet { fail_row_count: true, ..sheet() };

        let first = policy.resolve(at(BUSY), &cache, &source).await;
        assert_eq!(first.origin, LoadOrigin::Fetched);
        assert_eq!(cache.get(at(BUSY)).await.unwrap().sheet_row_count, 0);

        let second = policy.resolve(at(BUSY + 1), &cache, &source).await;
        assert_eq!(second.origin, LoadOrigin::Fetched);
        assert_eq!(source.values_calls(), 2);
    }

    #[tokio::test]
    async fn test_metadata_failure_invalidates_real_count() {
        let policy = FreshnessPolicy::default();
        let cache = SheetCache::new();
        let source = sheet();
        policy.resolve(at(BUSY), &cache, &source).await;

        let failing = FakeSheet { fail_row_count: true, ..sheet() };
        let load = policy.resolve(at(BUSY + 1), &cache, &failing).await;
        assert_eq!(load.origin, LoadOrigin::Fetched);
        assert_eq!(failing.values_calls(), 1);
    }
}
