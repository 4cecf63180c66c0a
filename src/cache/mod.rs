//! TTL cache for enriched weather reports.
//!
//! [`WeatherCache`] maps a normalized city name to a [`WeatherReport`]
//! with an absolute expiry instant. Expiry is TTL-only (no size bound,
//! no LRU): reports for a given city stay valid for a fixed duration
//! configured at construction, and a background sweep removes entries
//! that were never re-queried.
//!
//! # Concurrency
//!
//! The mapping sits behind an `RwLock`; lookups and stats take the
//! shared lock, writes and the sweep take the exclusive lock. Hit/miss
//! counters are atomics so a lookup never needs writer exclusion.
//! Lookups are side-effect free on the mapping itself: an expired
//! entry is reported as a miss but only physically removed by an
//! overwrite or the sweep.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::telemetry;
use crate::types::WeatherReport;

/// How often the background sweep scans for expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct CacheEntry {
    report: WeatherReport,
    expires_at: SystemTime,
}

/// Cache statistics at one instant.
///
/// `hit_count`/`miss_count` are cumulative for the cache's lifetime and
/// survive [`WeatherCache::clear`]; `total_entries` and `entries` cover
/// only entries that have not yet expired.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
    /// Percentage of lookups that hit, `0.0` before the first lookup.
    pub hit_rate: f64,
    pub ttl_seconds: u64,
    /// Live entries with their formatted expiry times.
    pub entries: BTreeMap<String, String>,
}

/// Concurrency-safe TTL cache keyed by normalized city name.
pub struct WeatherCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl WeatherCache {
    /// Create a cache with the given TTL and the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock (deterministic expiry tests).
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        info!(ttl_secs = ttl.as_secs(), "cache initialized");
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            ttl,
            clock,
        }
    }

    /// Look up a report. A live entry is a hit, anything else a miss.
    ///
    /// Every call bumps exactly one of the hit/miss counters. The
    /// mapping is never mutated here; expired entries linger until an
    /// overwrite or the sweep removes them.
    pub fn get(&self, key: &str) -> Option<WeatherReport> {
        let entries = self.entries.read().expect("cache lock poisoned");
        let live = entries
            .get(key)
            .filter(|entry| self.clock.now() < entry.expires_at);

        match live {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(entry.report.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert or unconditionally replace the entry for `key`.
    ///
    /// The new entry expires a full TTL from now regardless of any
    /// previous entry's remaining lifetime. Hit/miss counters are not
    /// affected.
    pub fn insert(&self, key: impl Into<String>, report: WeatherReport) {
        let expires_at = self.clock.now() + self.ttl;
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key.into(), CacheEntry { report, expires_at });
    }

    /// Discard every entry. Cumulative hit/miss counters are preserved.
    pub fn clear(&self) {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.clear();
        info!("cache cleared");
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.read().expect("cache lock poisoned");
        entries.values().filter(|e| now < e.expires_at).count()
    }

    /// Whether the cache holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Statistics as of the call instant.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read().expect("cache lock poisoned");

        let mut live = BTreeMap::new();
        for (key, entry) in entries.iter() {
            if now < entry.expires_at {
                let expiry = DateTime::<Utc>::from(entry.expires_at)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string();
                live.insert(key.clone(), expiry);
            }
        }

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);

        CacheStats {
            total_entries: live.len(),
            hit_count: hits,
            miss_count: misses,
            hit_rate: hit_rate(hits, misses),
            ttl_seconds: self.ttl.as_secs(),
            entries: live,
        }
    }

    /// Physically remove expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().expect("cache lock poisoned");
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
        removed
    }

    /// Spawn the periodic sweep task if a tokio runtime is available.
    ///
    /// The task holds only a weak reference, so dropping the cache (and
    /// the returned handle) ends it. Without a runtime this returns
    /// `None` and expired entries are still invisible to lookups, just
    /// not reclaimed until overwritten.
    pub fn try_spawn_sweeper(self: &Arc<Self>, every: Duration) -> Option<SweeperHandle> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let cache = Arc::downgrade(self);
        let handle = runtime.spawn(run_sweeper(cache, every));
        Some(SweeperHandle { handle })
    }
}

async fn run_sweeper(cache: Weak<WeatherCache>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // The first tick fires immediately; skip it so a fresh cache isn't
    // swept at construction.
    ticker.tick().await;
    loop {
        ticker.tick().await;
        match cache.upgrade() {
            Some(cache) => {
                cache.sweep();
            }
            None => break,
        }
    }
}

/// Owner handle for the background sweep task; aborts the task on drop.
pub struct SweeperHandle {
    handle: JoinHandle<()>,
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        return 0.0;
    }
    hits as f64 / total as f64 * 100.0
}
