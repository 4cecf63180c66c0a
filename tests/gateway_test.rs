//! Tests for [`WeatherGateway`] — cache-aside flow, enrichment
//! degradation, validation, and metrics recording.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use vedrfolnir::gateway::{AQI_UNAVAILABLE, UV_INDEX_UNAVAILABLE};
use vedrfolnir::types::{
    AirQuality, CloudCover, ConditionSummary, Coordinates, CurrentConditions, MainReadings,
    SysBlock, WindReading,
};
use vedrfolnir::{
    Clock, Result, Vedrfolnir, VedrfolnirError, WeatherGateway, WeatherProvider,
};

// ============================================================================
// Mock provider
// ============================================================================

#[derive(Default)]
struct MockProvider {
    conditions_calls: AtomicU32,
    uv_calls: AtomicU32,
    air_calls: AtomicU32,
    fail_conditions: Option<fn() -> VedrfolnirError>,
    fail_uv: bool,
    panic_uv: bool,
    fail_air: bool,
}

impl MockProvider {
    fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn current_conditions(&self, _city: &str) -> Result<CurrentConditions> {
        self.conditions_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(fail) = self.fail_conditions {
            return Err(fail());
        }
        Ok(sample_conditions())
    }

    async fn uv_index(&self, _lat: f64, _lon: f64) -> Result<f64> {
        self.uv_calls.fetch_add(1, Ordering::Relaxed);
        if self.panic_uv {
            panic!("uv provider exploded");
        }
        if self.fail_uv {
            return Err(VedrfolnirError::Http("uv endpoint down".to_string()));
        }
        Ok(4.5)
    }

    async fn air_quality(&self, _lat: f64, _lon: f64) -> Result<AirQuality> {
        self.air_calls.fetch_add(1, Ordering::Relaxed);
        if self.fail_air {
            return Err(VedrfolnirError::Http("pollution endpoint down".to_string()));
        }
        Ok(AirQuality {
            index: 2,
            category: "Fair".to_string(),
        })
    }
}

fn sample_conditions() -> CurrentConditions {
    CurrentConditions {
        name: "London".to_string(),
        coord: Coordinates {
            lat: 51.51,
            lon: -0.13,
        },
        weather: vec![ConditionSummary {
            main: "Clouds".to_string(),
            description: "overcast clouds".to_string(),
            icon: "04d".to_string(),
        }],
        main: MainReadings {
            temp: 15.0,
            feels_like: 14.2,
            temp_min: 13.0,
            temp_max: 17.0,
            pressure: 1012,
            humidity: 72,
        },
        visibility: 10_000,
        wind: WindReading {
            speed: 5.0,
            deg: 200,
        },
        clouds: CloudCover { all: 90 },
        sys: SysBlock {
            country: "GB".to_string(),
            sunrise: 1_609_484_400,
            sunset: 1_609_513_200,
        },
        timezone: 0,
    }
}

fn gateway_with(provider: Arc<MockProvider>) -> WeatherGateway {
    Vedrfolnir::builder()
        .provider(provider)
        .build()
        .expect("builder accepts injected provider")
}

// ============================================================================
// Cache-aside flow
// ============================================================================

#[tokio::test]
async fn miss_fetches_then_hit_serves_from_cache() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider.clone());

    let first = gateway.get_weather("london").await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.city, "London");
    assert_eq!(first.uv_index, 4.5);
    assert_eq!(first.air_quality.index, 2);
    assert_eq!(first.air_quality.category, "Fair");

    let second = gateway.get_weather("london").await.unwrap();
    assert!(second.from_cache);

    // No further upstream traffic for the second call.
    assert_eq!(provider.conditions_calls.load(Ordering::Relaxed), 1);
    assert_eq!(provider.uv_calls.load(Ordering::Relaxed), 1);
    assert_eq!(provider.air_calls.load(Ordering::Relaxed), 1);

    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.total_requests, 2);
    assert_eq!(snap.success_requests, 2);
    assert_eq!(snap.cache_hits, 1);
    assert_eq!(snap.cache_misses, 1);
}

#[tokio::test]
async fn city_names_are_normalized_before_lookup() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider.clone());

    gateway.get_weather("  London  ").await.unwrap();
    let second = gateway.get_weather("LONDON").await.unwrap();

    assert!(second.from_cache);
    assert_eq!(provider.conditions_calls.load(Ordering::Relaxed), 1);
    assert!(gateway.cache_stats().entries.contains_key("london"));
}

#[tokio::test]
async fn expired_entry_triggers_refetch() {
    struct ManualClock {
        now: Mutex<SystemTime>,
    }
    impl Clock for ManualClock {
        fn now(&self) -> SystemTime {
            *self.now.lock().unwrap()
        }
    }

    let clock = Arc::new(ManualClock {
        now: Mutex::new(UNIX_EPOCH + Duration::from_secs(1_600_000_000)),
    });
    let provider = MockProvider::healthy();
    let gateway = Vedrfolnir::builder()
        .provider(provider.clone())
        .clock(clock.clone())
        .cache_ttl(Duration::from_secs(10))
        .build()
        .unwrap();

    gateway.get_weather("london").await.unwrap();
    *clock.now.lock().unwrap() += Duration::from_secs(11);

    let refetched = gateway.get_weather("london").await.unwrap();
    assert!(!refetched.from_cache);
    assert_eq!(provider.conditions_calls.load(Ordering::Relaxed), 2);
}

#[tokio::test]
async fn clear_cache_forces_refetch_but_keeps_counters() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider.clone());

    gateway.get_weather("london").await.unwrap();
    gateway.get_weather("london").await.unwrap();
    gateway.clear_cache();

    let after_clear = gateway.get_weather("london").await.unwrap();
    assert!(!after_clear.from_cache);
    assert_eq!(provider.conditions_calls.load(Ordering::Relaxed), 2);

    // Cumulative cache counters survive the clear.
    let stats = gateway.cache_stats();
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.miss_count, 2);
}

// ============================================================================
// Enrichment degradation
// ============================================================================

#[tokio::test]
async fn failed_uv_fetch_degrades_to_sentinel() {
    let provider = Arc::new(MockProvider {
        fail_uv: true,
        ..Default::default()
    });
    let gateway = gateway_with(provider.clone());

    let report = gateway.get_weather("london").await.unwrap();
    assert_eq!(report.uv_index, UV_INDEX_UNAVAILABLE);
    // The other branch is untouched.
    assert_eq!(report.air_quality.index, 2);

    // Still a successful request.
    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.success_requests, 1);
    assert_eq!(snap.errors, 0);
}

#[tokio::test]
async fn failed_air_quality_fetch_degrades_to_sentinel() {
    let provider = Arc::new(MockProvider {
        fail_air: true,
        ..Default::default()
    });
    let gateway = gateway_with(provider);

    let report = gateway.get_weather("london").await.unwrap();
    assert_eq!(report.air_quality.index, AQI_UNAVAILABLE);
    assert_eq!(report.air_quality.category, "Unknown");
    assert_eq!(report.uv_index, 4.5);
}

#[tokio::test]
async fn both_enrichments_failing_still_succeeds() {
    let provider = Arc::new(MockProvider {
        fail_uv: true,
        fail_air: true,
        ..Default::default()
    });
    let gateway = gateway_with(provider);

    let report = gateway.get_weather("london").await.unwrap();
    assert_eq!(report.uv_index, UV_INDEX_UNAVAILABLE);
    assert_eq!(report.air_quality.index, AQI_UNAVAILABLE);
}

#[tokio::test]
async fn panicking_enrichment_branch_is_isolated() {
    let provider = Arc::new(MockProvider {
        panic_uv: true,
        ..Default::default()
    });
    let gateway = gateway_with(provider);

    let report = gateway.get_weather("london").await.unwrap();
    assert_eq!(report.uv_index, UV_INDEX_UNAVAILABLE);
    // The sibling branch completed normally.
    assert_eq!(report.air_quality.index, 2);
}

#[tokio::test]
async fn degraded_report_is_cached_like_a_healthy_one() {
    let provider = Arc::new(MockProvider {
        fail_uv: true,
        ..Default::default()
    });
    let gateway = gateway_with(provider.clone());

    gateway.get_weather("london").await.unwrap();
    let cached = gateway.get_weather("london").await.unwrap();

    assert!(cached.from_cache);
    assert_eq!(cached.uv_index, UV_INDEX_UNAVAILABLE);
    assert_eq!(provider.uv_calls.load(Ordering::Relaxed), 1);
}

// ============================================================================
// Primary failure
// ============================================================================

#[tokio::test]
async fn primary_failure_aborts_without_caching() {
    let provider = Arc::new(MockProvider {
        fail_conditions: Some(|| VedrfolnirError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        }),
        ..Default::default()
    });
    let gateway = gateway_with(provider.clone());

    let err = gateway.get_weather("london").await.unwrap_err();
    assert!(matches!(err, VedrfolnirError::Api { status: 503, .. }));

    // Nothing cached, no enrichment attempted.
    assert_eq!(gateway.cache_stats().total_entries, 0);
    assert_eq!(provider.uv_calls.load(Ordering::Relaxed), 0);
    assert_eq!(provider.air_calls.load(Ordering::Relaxed), 0);

    // Recorded as a failed, cache-miss observation.
    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.total_requests, 1);
    assert_eq!(snap.errors, 1);
    assert_eq!(snap.cache_misses, 1);
}

#[tokio::test]
async fn unknown_city_error_passes_through() {
    let provider = Arc::new(MockProvider {
        fail_conditions: Some(|| VedrfolnirError::CityNotFound("atlantis".to_string())),
        ..Default::default()
    });
    let gateway = gateway_with(provider);

    let err = gateway.get_weather("atlantis").await.unwrap_err();
    assert!(err.is_not_found());
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn blank_city_is_rejected_before_any_io() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider.clone());

    for input in ["", "   ", "\t\n"] {
        let err = gateway.get_weather(input).await.unwrap_err();
        assert!(matches!(err, VedrfolnirError::InvalidInput(_)));
    }

    assert_eq!(provider.conditions_calls.load(Ordering::Relaxed), 0);

    // Validation failures are not timed request observations.
    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.total_requests, 0);
    assert_eq!(snap.errors, 0);
    assert_eq!(snap.unique_cities, 0);
}

// ============================================================================
// Builder and admin surface
// ============================================================================

#[test]
fn builder_without_upstream_fails() {
    let result = Vedrfolnir::builder().build();
    assert!(matches!(
        result.unwrap_err(),
        VedrfolnirError::Configuration(_)
    ));
}

#[test]
fn builder_with_api_key_compiles_outside_runtime() {
    // Without a runtime the sweeper is skipped, not a panic.
    let gateway = Vedrfolnir::builder().api_key("fake-key").build();
    assert!(gateway.is_ok());
}

#[tokio::test]
async fn city_request_ranking_is_recorded() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider);

    for _ in 0..5 {
        gateway.get_weather("london").await.unwrap();
    }
    for _ in 0..3 {
        gateway.get_weather("paris").await.unwrap();
    }

    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.top_cities[0].city, "london");
    assert_eq!(snap.top_cities[0].count, 5);
    assert_eq!(snap.top_cities[1].city, "paris");
    assert_eq!(snap.top_cities[1].count, 3);
}

#[tokio::test]
async fn reset_metrics_starts_from_zero() {
    let provider = MockProvider::healthy();
    let gateway = gateway_with(provider);

    gateway.get_weather("london").await.unwrap();
    gateway.reset_metrics();

    let snap = gateway.metrics_snapshot();
    assert_eq!(snap.total_requests, 0);
    assert_eq!(snap.unique_cities, 0);

    // The cache is untouched by a metrics reset.
    assert_eq!(gateway.cache_stats().total_entries, 1);
}
