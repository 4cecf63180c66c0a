//! HTTP service surface (feature `server`).
//!
//! Thin axum layer over [`WeatherGateway`]: route wiring, status-code
//! mapping, and JSON payload shapes. No orchestration logic lives here.

pub mod config;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{PKG_VERSION, VedrfolnirError, WeatherGateway};

/// Build the service router.
///
/// Request logging comes from `TraceLayer`; CORS is permissive, matching
/// a public read-only API.
pub fn router(gateway: Arc<WeatherGateway>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/readiness", get(readiness))
        .route("/weather", get(weather))
        .route("/metrics", get(metrics_snapshot))
        .route("/metrics/reset", post(reset_metrics))
        .route("/cache", get(cache_stats))
        .route("/cache/clear", post(clear_cache))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(gateway)
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: Option<String>,
}

/// Error payload returned for every non-2xx response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        error: message.into(),
        code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}

/// Map a gateway error to its HTTP status.
fn status_for(err: &VedrfolnirError) -> StatusCode {
    match err {
        VedrfolnirError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        VedrfolnirError::CityNotFound(_) => StatusCode::NOT_FOUND,
        VedrfolnirError::Api { .. } | VedrfolnirError::Http(_) => StatusCode::BAD_GATEWAY,
        VedrfolnirError::Json(_) | VedrfolnirError::Configuration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn weather(
    State(gateway): State<Arc<WeatherGateway>>,
    Query(params): Query<WeatherQuery>,
) -> Response {
    let Some(city) = params.city else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "city parameter is required, usage: /weather?city=London",
        );
    };

    match gateway.get_weather(&city).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            error!(%city, error = %err, "weather request failed");
            error_response(status_for(&err), err.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    cache_entries: usize,
}

async fn health(State(gateway): State<Arc<WeatherGateway>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "vedrfolnir",
        version: PKG_VERSION,
        timestamp: Utc::now().to_rfc3339(),
        cache_entries: gateway.cache_len(),
    })
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    status: &'static str,
    timestamp: String,
    checks: ReadinessChecks,
}

#[derive(Debug, Serialize)]
struct ReadinessChecks {
    cache: bool,
    metrics: bool,
}

async fn readiness() -> Json<ReadinessResponse> {
    Json(ReadinessResponse {
        status: "ready",
        timestamp: Utc::now().to_rfc3339(),
        checks: ReadinessChecks {
            cache: true,
            metrics: true,
        },
    })
}

async fn metrics_snapshot(State(gateway): State<Arc<WeatherGateway>>) -> Response {
    Json(gateway.metrics_snapshot()).into_response()
}

#[derive(Debug, Serialize)]
struct AdminResponse {
    status: &'static str,
    message: &'static str,
    time: String,
}

async fn reset_metrics(State(gateway): State<Arc<WeatherGateway>>) -> Json<AdminResponse> {
    gateway.reset_metrics();
    Json(AdminResponse {
        status: "success",
        message: "metrics reset",
        time: Utc::now().to_rfc3339(),
    })
}

async fn cache_stats(State(gateway): State<Arc<WeatherGateway>>) -> Response {
    Json(gateway.cache_stats()).into_response()
}

async fn clear_cache(State(gateway): State<Arc<WeatherGateway>>) -> Json<AdminResponse> {
    gateway.clear_cache();
    Json(AdminResponse {
        status: "success",
        message: "cache cleared",
        time: Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
struct ServiceInfo {
    service: &'static str,
    version: &'static str,
    endpoints: &'static [&'static str],
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "vedrfolnir",
        version: PKG_VERSION,
        endpoints: &[
            "GET /weather?city={name}",
            "GET /health",
            "GET /readiness",
            "GET /metrics",
            "POST /metrics/reset",
            "GET /cache",
            "POST /cache/clear",
        ],
    })
}
