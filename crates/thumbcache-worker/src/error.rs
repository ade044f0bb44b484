//! Worker error taxonomy, aligned with the error kinds (§7): the variants
//! that are retried and the ones that are terminal for a job are kept
//! distinct so the executor doesn't need to string-match.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// Malformed video id or non-finite offset. Never retried.
    #[error("invalid input: {0}")]
    InputInvalid(String),

    /// Every configured playback provider failed, or one returned a
    /// terminal playability/login-required verdict.
    #[error("upstream resolution failed: {0}")]
    UpstreamResolution(#[from] thumbcache_resolver::ResolverError),

    /// Frame extractor non-zero exit or timeout, surfaced after the
    /// single proxy retry has also failed.
    #[error("thumbnail generation failed: {0}")]
    ThumbnailGeneration(String),

    /// The written artifact is smaller than the minimum threshold.
    #[error("generated artifact is undersized")]
    UndersizedOutput,

    #[error("coordinator store unavailable: {0}")]
    StoreUnavailable(#[from] thumbcache_coordinator::CoordinatorError),

    #[error("artifact store error: {0}")]
    Storage(#[from] thumbcache_storage::StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Whether the whole `generate` attempt should be retried once more,
    /// per the generator's outer retry policy (§4.D step 12: total
    /// tries = 2, only on `ThumbnailGenerationError`-equivalent failures).
    pub fn is_retryable_generation_failure(&self) -> bool {
        matches!(
            self,
            WorkerError::ThumbnailGeneration(_) | WorkerError::UndersizedOutput
        )
    }
}
