//! `GET /` (§6): redirects to the project's public repository.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> Response {
    (StatusCode::FOUND, Redirect::to(&state.config.project_url)).into_response()
}
