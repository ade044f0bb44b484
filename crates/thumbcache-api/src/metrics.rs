//! Prometheus metrics for the request-handling process.

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder. Called once at startup;
/// the returned handle is what `GET /metrics` renders from.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "thumbcache_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "thumbcache_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "thumbcache_http_requests_in_flight";

    pub const CACHE_HITS_TOTAL: &str = "thumbcache_cache_hits_total";
    pub const CACHE_MISSES_TOTAL: &str = "thumbcache_cache_misses_total";
    pub const OVERLOADED_TOTAL: &str = "thumbcache_overloaded_total";
    pub const GENERATION_FAILED_TOTAL: &str = "thumbcache_generation_failed_total";

    pub const QUEUE_DEPTH: &str = "thumbcache_queue_depth";
    pub const STORAGE_USED_BYTES: &str = "thumbcache_storage_used_bytes";
    pub const ACTIVE_WORKERS: &str = "thumbcache_active_workers";

    pub const CLEANUP_DURATION_SECONDS: &str = "thumbcache_cleanup_duration_seconds";
    pub const CLEANUP_VIDEOS_DELETED_TOTAL: &str = "thumbcache_cleanup_videos_deleted_total";
    pub const CLEANUP_BYTES_RECLAIMED_TOTAL: &str = "thumbcache_cleanup_bytes_reclaimed_total";
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];
    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_cache_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

pub fn record_overloaded() {
    counter!(names::OVERLOADED_TOTAL).increment(1);
}

pub fn record_generation_failed() {
    counter!(names::GENERATION_FAILED_TOTAL).increment(1);
}

pub fn set_queue_depth(depth: u64) {
    gauge!(names::QUEUE_DEPTH).set(depth as f64);
}

pub fn set_storage_used_bytes(bytes: u64) {
    gauge!(names::STORAGE_USED_BYTES).set(bytes as f64);
}

pub fn set_active_workers(count: u64) {
    gauge!(names::ACTIVE_WORKERS).set(count as f64);
}

pub fn record_cleanup_sweep(duration_secs: f64, videos_deleted: u64, bytes_reclaimed: u64) {
    histogram!(names::CLEANUP_DURATION_SECONDS).record(duration_secs);
    counter!(names::CLEANUP_VIDEOS_DELETED_TOTAL).increment(videos_deleted);
    counter!(names::CLEANUP_BYTES_RECLAIMED_TOTAL).increment(bytes_reclaimed);
}

/// Collapse the video id out of `/thumbnail` paths so distinct videos don't
/// each get their own metrics series.
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/thumbnail") {
        "/thumbnail".to_string()
    } else {
        path.to_string()
    }
}

/// Per-request timing and in-flight gauge, wired in as Axum middleware.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();
    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_path_collapses_thumbnail_query_strings() {
        assert_eq!(sanitize_path("/thumbnail"), "/thumbnail");
        assert_eq!(sanitize_path("/status"), "/status");
    }
}
