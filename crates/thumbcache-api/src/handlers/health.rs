//! `GET /health`, `GET /healthz` (§5.3, ambient): liveness only. Not in
//! `spec.md`'s HTTP surface, but every teacher binary carries one and no
//! Non-goal excludes it.

use axum::Json;
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

fn now() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

pub async fn health() -> Json<HealthResponse> {
    now()
}

pub async fn healthz() -> Json<HealthResponse> {
    now()
}
