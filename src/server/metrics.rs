use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Metric name prefix for all library graph metrics
const PREFIX: &str = "libgraph";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Provider Metrics
    pub static ref PROVIDER_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_provider_requests_total"), "Catalog API requests by endpoint and status"),
        &["endpoint", "status"]
    ).expect("Failed to create provider_requests_total metric");

    pub static ref TOKEN_REFRESHES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_token_refreshes_total"), "Access token refreshes"),
        &["result"]
    ).expect("Failed to create token_refreshes_total metric");

    // Triple Store Metrics
    pub static ref STORE_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_store_requests_total"), "Triple store requests by operation and status"),
        &["operation", "status"]
    ).expect("Failed to create store_requests_total metric");

    // Import Metrics
    pub static ref IMPORT_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_import_runs_total"), "Import runs by result"),
        &["result"]
    ).expect("Failed to create import_runs_total metric");

    pub static ref IMPORTED_TRACKS: Gauge = Gauge::new(
        format!("{PREFIX}_imported_tracks"),
        "Tracks written by the last successful import"
    ).expect("Failed to create imported_tracks metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PROVIDER_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(TOKEN_REFRESHES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(STORE_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMPORT_RUNS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(IMPORTED_TRACKS.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a catalog API request. `status` is the HTTP status or `error`.
pub fn record_provider_request(endpoint: &str, status: &str) {
    PROVIDER_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();
}

pub fn record_token_refresh(result: &str) {
    TOKEN_REFRESHES_TOTAL.with_label_values(&[result]).inc();
}

/// Record a triple store request. `status` is the HTTP status or `error`.
pub fn record_store_request(operation: &str, status: &str) {
    STORE_REQUESTS_TOTAL
        .with_label_values(&[operation, status])
        .inc();
}

pub fn record_import_run(result: &str) {
    IMPORT_RUNS_TOTAL.with_label_values(&[result]).inc();
}

pub fn set_imported_tracks(count: usize) {
    IMPORTED_TRACKS.set(count as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
