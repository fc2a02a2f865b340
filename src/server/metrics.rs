use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all SoundStory metrics
const PREFIX: &str = "soundstory";

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
        .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Playlist Metrics
    pub static ref PLAYLIST_OUTCOMES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_playlist_outcomes_total"), "Playlist requests by outcome"),
        &["outcome"]
    ).expect("Failed to create playlist_outcomes_total metric");

    pub static ref BEATS_FALLBACK_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_beats_fallback_total"),
            "Requests served with the default story beats"
        ),
        &["reason"]
    ).expect("Failed to create beats_fallback_total metric");

    // Upstream Metrics
    pub static ref UPSTREAM_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_upstream_errors_total"), "Failed calls to external services"),
        &["service"]
    ).expect("Failed to create upstream_errors_total metric");

    pub static ref ENRICHMENT_LOOKUPS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_enrichment_lookups_total"), "Track enrichment lookups"),
        &["outcome"]
    ).expect("Failed to create enrichment_lookups_total metric");
}

/// Initialize all metrics and register them with the registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PLAYLIST_OUTCOMES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(BEATS_FALLBACK_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(UPSTREAM_ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ENRICHMENT_LOOKUPS_TOTAL.clone()));

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

/// Record the outcome of a playlist request ("ok", "empty", "failed")
pub fn record_playlist_outcome(outcome: &str) {
    PLAYLIST_OUTCOMES_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_beats_fallback(reason: &str) {
    BEATS_FALLBACK_TOTAL.with_label_values(&[reason]).inc();
}

/// Record a failed call to an external service ("llm", "spotify", ...)
pub fn record_upstream_error(service: &str) {
    UPSTREAM_ERRORS_TOTAL.with_label_values(&[service]).inc();
}

/// Record an enrichment lookup ("hit", "miss", "error")
pub fn record_enrichment_lookup(outcome: &str) {
    ENRICHMENT_LOOKUPS_TOTAL.with_label_values(&[outcome]).inc();
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
