//! Telemetry metric name constants.
//!
//! Centralised metric names for vedrfolnir operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! These facade metrics are independent from the in-process
//! [`RequestMetrics`](crate::stats::RequestMetrics) aggregator that backs
//! the JSON metrics endpoint.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `vedrfolnir_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total weather requests served by the gateway.
///
/// Labels: `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "vedrfolnir_requests_total";

/// End-to-end request duration in seconds.
pub const REQUEST_DURATION_SECONDS: &str = "vedrfolnir_request_duration_seconds";

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "vedrfolnir_cache_hits_total";

/// Total cache misses.
pub const CACHE_MISSES_TOTAL: &str = "vedrfolnir_cache_misses_total";

/// Total enrichment fetches that failed and were replaced by a sentinel.
///
/// Labels: `source` ("uv_index" | "air_quality").
pub const ENRICHMENT_FAILURES_TOTAL: &str = "vedrfolnir_enrichment_failures_total";
