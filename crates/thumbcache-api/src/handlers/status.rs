//! `GET /status` (§6, §5.3, §5.4): privileged queue/storage/worker snapshot.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::Serialize;
use thumbcache_models::Priority;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub queue_depth_high: u64,
    pub queue_depth_normal: u64,
    pub storage_used_bytes: u64,
    pub active_workers: u64,
}

pub async fn status(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Response {
    match authorize(&state, auth) {
        Ok(()) => {}
        Err(e) => return e.into_response(),
    }

    let queue_depth_high = state
        .coordinator
        .queue_depth(Priority::High)
        .await
        .unwrap_or(0);
    let queue_depth_normal = state
        .coordinator
        .queue_depth(Priority::Normal)
        .await
        .unwrap_or(0);
    let storage_used_bytes = state.coordinator.read_storage().await.unwrap_or(0);
    let active_workers = state
        .coordinator
        .active_worker_count()
        .await
        .unwrap_or(0);

    crate::metrics::set_queue_depth(queue_depth_high + queue_depth_normal);
    crate::metrics::set_storage_used_bytes(storage_used_bytes);
    crate::metrics::set_active_workers(active_workers);

    Json(StatusResponse {
        queue_depth_high,
        queue_depth_normal,
        storage_used_bytes,
        active_workers,
    })
    .into_response()
}

/// `/status` has no auth requirement when `status_auth_token` is unset
/// (local/dev deployments); otherwise the bearer token must match exactly.
fn authorize(
    state: &AppState,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<(), ApiError> {
    let Some(expected) = &state.config.status_auth_token else {
        return Ok(());
    };

    match auth {
        Some(TypedHeader(Authorization(bearer))) if bearer.token() == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}
