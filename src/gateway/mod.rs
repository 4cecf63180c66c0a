//! The weather gateway — cache-aside orchestration with concurrent
//! enrichment.
//!
//! [`WeatherGateway`] is the entry point for callers. Each request runs:
//! normalize → cache lookup → (miss: primary fetch → UV/air-quality
//! fan-out → merge → cache write) → metrics record. The two enrichment
//! fetches run as independent spawned tasks joined before the merge;
//! either one failing (or panicking) degrades its field to a sentinel
//! instead of failing the request. A primary fetch failure aborts the
//! request with nothing cached.
//!
//! Concurrent misses for the same city are allowed to race: both fetch,
//! both write, last writer wins. Fetches are idempotent so this costs an
//! extra upstream call, not correctness.

mod builder;

pub use builder::{Vedrfolnir, VedrfolnirBuilder};

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinError;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheStats, SweeperHandle, WeatherCache};
use crate::clock::Clock;
use crate::convert;
use crate::providers::WeatherProvider;
use crate::stats::{MetricsSnapshot, RequestMetrics};
use crate::telemetry;
use crate::types::{AirQuality, WeatherReport};
use crate::{Result, VedrfolnirError};

pub use crate::types::{AQI_UNAVAILABLE, UV_INDEX_UNAVAILABLE};

/// Orchestrates cache, upstream provider, and metrics for one service.
pub struct WeatherGateway {
    provider: Arc<dyn WeatherProvider>,
    cache: Arc<WeatherCache>,
    stats: RequestMetrics,
    clock: Arc<dyn Clock>,
    _sweeper: Option<SweeperHandle>,
}

impl std::fmt::Debug for WeatherGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherGateway").finish_non_exhaustive()
    }
}

impl WeatherGateway {
    pub(crate) fn new(
        provider: Arc<dyn WeatherProvider>,
        cache_ttl: Duration,
        sweep_interval: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(WeatherCache::with_clock(cache_ttl, Arc::clone(&clock)));
        let sweeper = cache.try_spawn_sweeper(sweep_interval);
        Self {
            provider,
            cache,
            stats: RequestMetrics::new(),
            clock,
            _sweeper: sweeper,
        }
    }

    /// Fetch the enriched weather report for a city.
    ///
    /// The city name is trimmed and lowercased before anything else; a
    /// blank name fails with [`VedrfolnirError::InvalidInput`] before any
    /// cache or network access, and is not counted as a timed request
    /// observation.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn get_weather(&self, city: &str) -> Result<WeatherReport> {
        let started = Instant::now();

        let city = city.trim().to_lowercase();
        if city.is_empty() {
            return Err(VedrfolnirError::InvalidInput(
                "city name cannot be empty".to_string(),
            ));
        }

        self.stats.record_city_request(&city);

        if let Some(mut report) = self.cache.get(&city) {
            report.from_cache = true;
            self.record_request(started, true, true);
            debug!(%city, "cache hit");
            return Ok(report);
        }

        debug!(%city, "cache miss, fetching upstream");

        let conditions = match self.provider.current_conditions(&city).await {
            Ok(conditions) => conditions,
            Err(err) => {
                self.record_request(started, false, false);
                return Err(err);
            }
        };

        let mut report = convert::report_from_conditions(&conditions, self.clock.now());

        let (uv, air) = self
            .enrich(conditions.coord.lat, conditions.coord.lon)
            .await;
        report.uv_index = uv;
        report.air_quality = air;
        report.from_cache = false;

        self.cache.insert(city, report.clone());
        self.record_request(started, false, true);
        info!(
            city = %report.city,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched and cached weather"
        );
        Ok(report)
    }

    /// Run the two enrichment fetches concurrently and join them.
    ///
    /// Each branch is an isolated task: an error or panic in one leaves
    /// the other untouched and degrades only its own field.
    async fn enrich(&self, lat: f64, lon: f64) -> (f64, AirQuality) {
        let provider = Arc::clone(&self.provider);
        let uv_task = tokio::spawn(async move { provider.uv_index(lat, lon).await });
        let provider = Arc::clone(&self.provider);
        let air_task = tokio::spawn(async move { provider.air_quality(lat, lon).await });

        let (uv_joined, air_joined) = tokio::join!(uv_task, air_task);

        let uv = match flatten(uv_joined) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "UV index fetch failed, using sentinel");
                metrics::counter!(telemetry::ENRICHMENT_FAILURES_TOTAL, "source" => "uv_index")
                    .increment(1);
                UV_INDEX_UNAVAILABLE
            }
        };

        let air = match flatten(air_joined) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "air quality fetch failed, using sentinel");
                metrics::counter!(telemetry::ENRICHMENT_FAILURES_TOTAL, "source" => "air_quality")
                    .increment(1);
                AirQuality {
                    index: AQI_UNAVAILABLE,
                    category: "Unknown".to_string(),
                }
            }
        };

        (uv, air)
    }

    fn record_request(&self, started: Instant, cache_hit: bool, ok: bool) {
        let elapsed = started.elapsed();
        self.stats.record_request(elapsed, cache_hit, ok);

        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS).record(elapsed.as_secs_f64());
    }

    /// Cache statistics as of now.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of live cache entries (health endpoint).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Aggregated request metrics as of now.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.stats.snapshot()
    }

    /// Administrative: drop all cached reports. Hit/miss counters keep
    /// their cumulative values.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Administrative: zero all aggregated metrics and restart uptime.
    pub fn reset_metrics(&self) {
        self.stats.reset();
    }
}

fn flatten<T>(joined: std::result::Result<Result<T>, JoinError>) -> Result<T> {
    match joined {
        Ok(inner) => inner,
        Err(err) => Err(VedrfolnirError::Http(format!(
            "enrichment task failed: {err}"
        ))),
    }
}
