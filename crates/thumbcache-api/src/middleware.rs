//! Ambient HTTP middleware: request ids, structured logging, security
//! headers. No rate limiting or CORS layer here - this process sits behind
//! trusted internal callers (§3 Non-goals), not a public browser origin.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use tracing::{info, Span};
use uuid::Uuid;

/// Assign a request id (honoring an inbound `X-Request-ID` if present) and
/// echo it back on the response, for correlating a request across the API
/// and worker processes' logs.
pub async fn request_id(mut request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = request
        .headers()
        .get("X-Request-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());
    Span::current().record("request_id", &request_id);

    let mut response = next.run(request).await;
    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert("X-Request-ID", header_value);
    }
    response
}

/// A handful of hardcoded, always-valid security headers.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert(
        "Referrer-Policy",
        "strict-origin-when-cross-origin".parse().unwrap(),
    );
    headers.insert("Cross-Origin-Resource-Policy", "same-origin".parse().unwrap());

    response
}

/// Logs method, path, status and latency for every request except the
/// health probes, which fire too often to be worth a line each.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration = start.elapsed();

    if !matches!(uri.path(), "/health" | "/healthz") {
        info!(
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "request completed"
        );
    }

    response
}
