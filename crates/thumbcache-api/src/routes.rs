//! HTTP surface (§5.3): wires the five routes over [`AppState`].

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::{health, healthz, root, status, thumbnail};
use crate::metrics::metrics_middleware;
use crate::middleware::{request_id, request_logging, security_headers};
use crate::state::AppState;

pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let metrics_routes = match metrics_handle {
        Some(handle) => Router::new().route("/metrics", get(move || async move { handle.render() })),
        None => Router::new(),
    };

    Router::new()
        .route("/thumbnail", get(thumbnail))
        .route("/", get(root))
        .route("/status", get(status))
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .with_state(state)
}
