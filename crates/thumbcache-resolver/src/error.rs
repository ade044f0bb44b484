//! Resolver error types, classified per provider outcome.

use thiserror::Error;

pub type ResolverResult<T> = Result<T, ResolverError>;

#[derive(Debug, Error)]
pub enum ResolverError {
    /// The upstream call failed in a way another provider might still
    /// succeed at (network error, timeout, malformed response).
    #[error("transient resolution failure: {0}")]
    Transient(String),

    /// The video itself is unplayable (removed, region-blocked, etc).
    /// Trying another provider won't help.
    #[error("video is not playable: {0}")]
    Playability(String),

    /// The upstream demanded credentials this resolver doesn't have.
    #[error("login required: {0}")]
    LoginRequired(String),

    #[error("signing helper protocol error: {0}")]
    SigningHelper(String),

    #[error("no playback provider is enabled")]
    NoProviderEnabled,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Coordinator(#[from] thumbcache_coordinator::CoordinatorError),
}

impl ResolverError {
    /// Whether a different provider in the fallback chain is worth trying.
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolverError::Transient(_) | ResolverError::Io(_) | ResolverError::Http(_))
    }
}
