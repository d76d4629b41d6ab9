//! Prometheus metrics for the card server.
//!
//! Provides metrics collection and helpers used by the handlers; the
//! `/metrics` endpoint itself is wired up in the binary.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

// Metric names as constants for consistency
const HTTP_REQUESTS_TOTAL: &str = "card_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "card_http_request_duration_seconds";
const DOCUMENTS_TOTAL: &str = "card_documents_total";
const TEMPLATES_TOTAL: &str = "card_templates_total";
const EXPORTS_TOTAL: &str = "card_exports_total";
const API_ERRORS_TOTAL: &str = "card_api_errors_total";
const VALIDATION_FAILURES_TOTAL: &str = "card_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `path` - Matched route path, not the raw URI
/// * `status` - HTTP status code
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Update the stored card count.
pub fn set_documents_total(count: usize) {
    gauge!(DOCUMENTS_TOTAL).set(count as f64);
}

/// Update the template catalog size.
pub fn set_templates_total(count: usize) {
    gauge!(TEMPLATES_TOTAL).set(count as f64);
}

/// Record an export request.
///
/// # Arguments
///
/// * `format` - Export format name (png, jpeg, svg)
/// * `success` - Whether rendering succeeded
pub fn record_export(format: &str, success: bool) {
    counter!(
        EXPORTS_TOTAL,
        "format" => format.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Record an error response by status code.
pub fn record_api_error(status: u16) {
    counter!(
        API_ERRORS_TOTAL,
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `field` - What failed (title, document, export_format, ...)
pub fn record_validation_failure(field: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "field" => field.to_string()
    )
    .increment(1);
}

/// Axum middleware recording request count and latency per matched route.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    // The route template, so /api/cards/{id} aggregates rather than one
    // series per card id.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path().to_string(), |p| p.as_str().to_string());

    let start = Instant::now();
    let response = next.run(request).await;
    record_http_request(
        method.as_str(),
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}
