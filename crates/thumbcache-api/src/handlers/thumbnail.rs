//! `GET /thumbnail` (§6, §5.3): the one hot-path endpoint everything else
//! in this crate exists to serve.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use thumbcache_models::{Fingerprint, Priority, TimeOffset, VideoId};

use crate::coordinator::GetOutcome;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    #[serde(rename = "videoID")]
    video_id: String,
    time: Option<f64>,
    title: Option<String>,
    #[serde(default, rename = "generateNow")]
    generate_now: bool,
    #[serde(default, rename = "isLivestream")]
    is_livestream: bool,
    #[serde(default)]
    latest: bool,
    #[serde(rename = "authToken")]
    auth_token: Option<String>,
}

pub async fn thumbnail(
    State(state): State<AppState>,
    Query(query): Query<ThumbnailQuery>,
) -> ApiResult<Response> {
    let video_id = VideoId::parse(&query.video_id)
        .map_err(|e| ApiError::BadRequest(format!("invalid videoID: {e}")))?;

    let priority = priority_for(&state, query.auth_token.as_deref());

    if query.latest || query.time.is_none() {
        return Ok(match state.request_coordinator.get_latest(&video_id).await {
            Some(artifact) => {
                metrics::record_cache_hit();
                artifact_response(artifact, query.title.as_deref())
            }
            None => {
                metrics::record_cache_miss();
                StatusCode::NO_CONTENT.into_response()
            }
        });
    }

    let time = TimeOffset::parse(query.time.unwrap())
        .map_err(|e| ApiError::BadRequest(format!("invalid time: {e}")))?;
    let fp = Fingerprint::new(video_id, time);

    let outcome = state
        .request_coordinator
        .get(&fp, query.title.clone(), query.generate_now, query.is_livestream, priority)
        .await;

    Ok(match outcome {
        GetOutcome::Ready(artifact) => {
            metrics::record_cache_hit();
            artifact_response(artifact, query.title.as_deref())
        }
        GetOutcome::NotReady => {
            metrics::record_cache_miss();
            StatusCode::NO_CONTENT.into_response()
        }
        GetOutcome::Overloaded => {
            metrics::record_overloaded();
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
        GetOutcome::GenerationFailed => {
            metrics::record_generation_failed();
            StatusCode::NO_CONTENT.into_response()
        }
    })
}

/// `front_auth` grants the high-priority queue; anything else (including
/// no token at all) gets normal priority.
fn priority_for(state: &AppState, auth_token: Option<&str>) -> Priority {
    match (&state.config.front_auth, auth_token) {
        (Some(expected), Some(given)) if expected == given => Priority::High,
        _ => Priority::Normal,
    }
}

/// `X-Title` is only set when the server holds a title and the caller
/// didn't already supply one (§6: echoing it back would be redundant).
fn artifact_response(artifact: thumbcache_models::Artifact, requested_title: Option<&str>) -> Response {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/webp")
        .header("X-Timestamp", artifact.offset.canonical());

    if requested_title.is_none() {
        if let Some(title) = &artifact.title {
            if let Ok(value) = header::HeaderValue::from_str(title) {
                builder = builder.header("X-Title", value);
            }
        }
    }

    builder
        .body(axum::body::Body::from(artifact.image))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_requires_exact_token_match() {
        let mut config = thumbcache_config::AppConfig::load(Some("/nonexistent/config.yaml")).unwrap();
        config.front_auth = Some("secret".to_string());
        let state = fake_state(config);

        assert_eq!(priority_for(&state, Some("secret")), Priority::High);
        assert_eq!(priority_for(&state, Some("wrong")), Priority::Normal);
        assert_eq!(priority_for(&state, None), Priority::Normal);
    }

    fn fake_state(config: thumbcache_config::AppConfig) -> AppState {
        AppState::new(config).expect("redis client construction is lazy, never connects here")
    }
}
