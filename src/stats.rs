//! Request metrics aggregation.
//!
//! [`RequestMetrics`] keeps in-process counters plus a bounded window of
//! recent latencies and answers snapshots with derived rates, exact
//! percentiles, and a top-cities ranking. It backs the JSON metrics
//! endpoint; the `metrics` facade counters in [`crate::telemetry`] are a
//! separate, exporter-facing channel.
//!
//! Recording takes the exclusive lock, snapshots the shared lock. The
//! per-city counter map is unbounded, which is fine for the moderate
//! cardinality of city names but worth revisiting if keys ever become
//! user-controlled free text.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use serde::Serialize;

/// How many latency samples the window retains (FIFO beyond this).
const LATENCY_WINDOW: usize = 1000;

/// How many cities the snapshot ranking includes.
const TOP_CITIES: usize = 10;

/// One city with its cumulative request count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: u64,
}

/// Point-in-time view of all aggregated metrics.
///
/// Snapshots of identical underlying state are identical: percentile
/// indexing uses a total order on the samples and the city ranking
/// breaks count ties by name.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: u64,
    pub success_requests: u64,
    pub errors: u64,
    /// Percentage of requests that failed, in `[0, 100]`.
    pub error_rate: f64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Percentage of requests served from cache, in `[0, 100]`.
    pub cache_hit_rate: f64,
    pub average_response_ms: f64,
    pub p95_response_ms: f64,
    pub p99_response_ms: f64,
    pub uptime_seconds: f64,
    pub requests_per_minute: f64,
    pub top_cities: Vec<CityCount>,
    pub unique_cities: usize,
}

struct Inner {
    total: u64,
    success: u64,
    errors: u64,
    cache_hits: u64,
    cache_misses: u64,
    latencies_ms: VecDeque<f64>,
    city_counts: HashMap<String, u64>,
    started: Instant,
}

impl Inner {
    fn fresh() -> Self {
        Self {
            total: 0,
            success: 0,
            errors: 0,
            cache_hits: 0,
            cache_misses: 0,
            latencies_ms: VecDeque::with_capacity(LATENCY_WINDOW),
            city_counts: HashMap::new(),
            started: Instant::now(),
        }
    }
}

/// Aggregator for request observations.
pub struct RequestMetrics {
    inner: RwLock<Inner>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::fresh()),
        }
    }

    /// Record one completed request observation.
    ///
    /// Maintains `total == success + errors == cache_hits + cache_misses`.
    /// The latency is kept in whole milliseconds; the oldest sample is
    /// evicted once the window is full.
    pub fn record_request(&self, duration: Duration, cache_hit: bool, ok: bool) {
        let mut inner = self.inner.write().expect("metrics lock poisoned");

        inner.total += 1;
        if ok {
            inner.success += 1;
        } else {
            inner.errors += 1;
        }
        if cache_hit {
            inner.cache_hits += 1;
        } else {
            inner.cache_misses += 1;
        }

        if inner.latencies_ms.len() == LATENCY_WINDOW {
            inner.latencies_ms.pop_front();
        }
        inner.latencies_ms.push_back(duration.as_millis() as f64);
    }

    /// Bump the request count for one city.
    pub fn record_city_request(&self, city: &str) {
        let mut inner = self.inner.write().expect("metrics lock poisoned");
        *inner.city_counts.entry(city.to_string()).or_insert(0) += 1;
    }

    /// Compute a snapshot of all metrics. Read-only.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.read().expect("metrics lock poisoned");

        let uptime = inner.started.elapsed();
        let uptime_minutes = uptime.as_secs_f64() / 60.0;
        let requests_per_minute = if uptime_minutes > 0.0 {
            inner.total as f64 / uptime_minutes
        } else {
            0.0
        };

        MetricsSnapshot {
            total_requests: inner.total,
            success_requests: inner.success,
            errors: inner.errors,
            error_rate: rate(inner.errors, inner.total),
            cache_hits: inner.cache_hits,
            cache_misses: inner.cache_misses,
            cache_hit_rate: rate(inner.cache_hits, inner.cache_hits + inner.cache_misses),
            average_response_ms: mean(&inner.latencies_ms),
            p95_response_ms: percentile(&inner.latencies_ms, 95),
            p99_response_ms: percentile(&inner.latencies_ms, 99),
            uptime_seconds: uptime.as_secs_f64(),
            requests_per_minute,
            top_cities: top_cities(&inner.city_counts, TOP_CITIES),
            unique_cities: inner.city_counts.len(),
        }
    }

    /// Zero all counters, drop the latency window and city counts, and
    /// restart the uptime clock. Administrative use only.
    pub fn reset(&self) {
        let mut inner = self.inner.write().expect("metrics lock poisoned");
        *inner = Inner::fresh();
    }
}

impl Default for RequestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

fn mean(samples: &VecDeque<f64>) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Exact order-statistic percentile: sort ascending, take the value at
/// `floor(N * p / 100)` clamped to the last index. `0.0` for an empty
/// window.
fn percentile(samples: &VecDeque<f64>, p: u8) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f64> = samples.iter().copied().collect();
    sorted.sort_by(f64::total_cmp);

    let index = (sorted.len() * usize::from(p)) / 100;
    sorted[index.min(sorted.len() - 1)]
}

/// Top `k` cities by count, descending, ties broken by city name so the
/// ranking is stable across snapshots.
fn top_cities(counts: &HashMap<String, u64>, k: usize) -> Vec<CityCount> {
    let mut ranked: Vec<CityCount> = counts
        .iter()
        .map(|(city, count)| CityCount {
            city: city.clone(),
            count: *count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.city.cmp(&b.city)));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_window_is_zero() {
        assert_eq!(percentile(&VecDeque::new(), 95), 0.0);
    }

    #[test]
    fn percentile_single_sample() {
        let samples: VecDeque<f64> = [42.0].into_iter().collect();
        assert_eq!(percentile(&samples, 95), 42.0);
        assert_eq!(percentile(&samples, 99), 42.0);
    }

    #[test]
    fn percentile_index_is_floor_of_n_p() {
        // 100 samples 10, 20, ..., 1000: p95 lands on sorted index 95,
        // the 96th smallest value.
        let samples: VecDeque<f64> = (1..=100).map(|i| (i * 10) as f64).collect();
        assert_eq!(percentile(&samples, 95), 960.0);
        assert_eq!(percentile(&samples, 99), 1000.0);
        assert_eq!(percentile(&samples, 50), 510.0);
    }

    #[test]
    fn percentile_unsorted_input() {
        let samples: VecDeque<f64> = [30.0, 10.0, 20.0].into_iter().collect();
        // index = floor(3 * 50 / 100) = 1
        assert_eq!(percentile(&samples, 50), 20.0);
    }

    #[test]
    fn rate_zero_denominator() {
        assert_eq!(rate(5, 0), 0.0);
    }

    #[test]
    fn top_cities_ties_break_by_name() {
        let mut counts = HashMap::new();
        counts.insert("oslo".to_string(), 2);
        counts.insert("bergen".to_string(), 2);
        counts.insert("tromso".to_string(), 5);
        let ranked = top_cities(&counts, 10);
        assert_eq!(ranked[0].city, "tromso");
        assert_eq!(ranked[1].city, "bergen");
        assert_eq!(ranked[2].city, "oslo");
    }
}
