//! Request Coordinator (§4.E): the arbiter that turns a `(video, time)`
//! request into a ready artifact, a pending build, or a rejection.
//!
//! This is the "core" the system exists for - everything else in this
//! crate (the cleanup loop, the HTTP handlers) is glue around this one
//! type.

use std::time::Duration;

use futures_util::StreamExt;
use thumbcache_coordinator::CoordinatorStore;
use thumbcache_models::{Artifact, Fingerprint, Priority, QueuedJob};
use thumbcache_storage::{ArtifactStore, StorageError};
use tracing::{debug, warn};

use thumbcache_config::ThumbnailStorageConfig;

/// What a `get` call resolves to. None of these are [`crate::ApiError`] -
/// they're the ordinary, expected shapes of a cache lookup (§4.E, §7).
#[derive(Debug)]
pub enum GetOutcome {
    /// The artifact is on disk (either it already was, or the wait
    /// resolved before the timeout).
    Ready(Artifact),
    /// Still being generated; try again later (204).
    NotReady,
    /// Queue depth exceeds `max_queue_size` (503).
    Overloaded,
    /// The job ran and published a terminal failure (§7
    /// Upstream-resolution / Undersized-output / Transient-generation,
    /// all collapsed to one outcome here since the client can't act
    /// differently on any of them).
    GenerationFailed,
}

pub struct RequestCoordinator {
    storage: ArtifactStore,
    coordinator: CoordinatorStore,
    config: ThumbnailStorageConfig,
}

impl RequestCoordinator {
    pub fn new(
        storage: ArtifactStore,
        coordinator: CoordinatorStore,
        config: ThumbnailStorageConfig,
    ) -> Self {
        Self {
            storage,
            coordinator,
            config,
        }
    }

    /// §4.E `get(video_id, time, generate_now, title?)`.
    pub async fn get(
        &self,
        fp: &Fingerprint,
        title: Option<String>,
        generate_now: bool,
        is_livestream: bool,
        priority: Priority,
    ) -> GetOutcome {
        if let Some(artifact) = self.try_read(fp).await {
            return GetOutcome::Ready(artifact);
        }

        let queue_depth = match self.coordinator.total_queue_depth().await {
            Ok(depth) => depth,
            Err(e) => {
                warn!(error = %e, "failed to read queue depth, admitting request anyway");
                0
            }
        };
        if queue_depth >= self.config.max_queue_size {
            return GetOutcome::Overloaded;
        }

        // Subscribe before the dedup/enqueue round trip closes the race
        // between "we just missed" and "the job that was already running
        // finishes right now" (§5 ordering guarantees: late subscribers
        // must re-read, never replay).
        let mut status_stream = match self.coordinator.subscribe_status(fp).await {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, job_id = %fp.job_id(), "failed to subscribe to status channel");
                None
            }
        };

        match self.coordinator.try_create_job(fp).await {
            Ok(true) => {
                let job = QueuedJob::new(&fp.video_id, fp.time, priority)
                    .with_title(title)
                    .with_livestream(is_livestream);
                if let Err(e) = self.coordinator.enqueue_job(priority, &job).await {
                    warn!(error = %e, job_id = %fp.job_id(), "failed to enqueue job");
                }
            }
            Ok(false) => {
                debug!(job_id = %fp.job_id(), "attaching to in-flight job");
            }
            Err(e) => {
                warn!(error = %e, job_id = %fp.job_id(), "failed to claim job dedup marker, enqueueing anyway");
                let job = QueuedJob::new(&fp.video_id, fp.time, priority)
                    .with_title(title)
                    .with_livestream(is_livestream);
                let _ = self.coordinator.enqueue_job(priority, &job).await;
            }
        }

        // Re-check in case the job that was already running finished
        // between the first read and the subscribe above.
        if let Some(artifact) = self.try_read(fp).await {
            return GetOutcome::Ready(artifact);
        }

        let position = self
            .coordinator
            .position(priority, fp)
            .await
            .unwrap_or(None)
            .unwrap_or(0);

        if position > self.config.max_before_async_generation as usize && !generate_now {
            return GetOutcome::NotReady;
        }

        let Some(mut status_stream) = status_stream.take() else {
            return GetOutcome::NotReady;
        };

        let wait = tokio::time::timeout(
            self.config.timeout_before_async_generation(),
            status_stream.next(),
        )
        .await;

        match wait {
            Ok(Some(true)) => match self.try_read(fp).await {
                Some(artifact) => GetOutcome::Ready(artifact),
                None => GetOutcome::NotReady,
            },
            Ok(Some(false)) => GetOutcome::GenerationFailed,
            Ok(None) => GetOutcome::NotReady,
            Err(_timeout) => match self.try_read(fp).await {
                Some(artifact) => GetOutcome::Ready(artifact),
                None => GetOutcome::NotReady,
            },
        }
    }

    /// Read the artifact store and, on a hit, best-effort bump the
    /// recency index. A miss (not found, or an undersized/empty file the
    /// store already discarded) is `None`.
    async fn try_read(&self, fp: &Fingerprint) -> Option<Artifact> {
        match self.storage.read(fp).await {
            Ok(artifact) => {
                if let Err(e) = self.coordinator.update_last_used(&fp.video_id).await {
                    warn!(error = %e, video_id = %fp.video_id, "failed to update recency index on read");
                }
                Some(artifact)
            }
            Err(StorageError::NotFound(_)) => None,
            Err(e) => {
                warn!(error = %e, job_id = %fp.job_id(), "artifact store read failed");
                None
            }
        }
    }

    /// The "any recent thumbnail" path (§4 supplement): prefer the
    /// Best-Time Hint when it names a file that's actually present,
    /// otherwise fall back to the newest entry on disk.
    pub async fn get_latest(&self, video_id: &thumbcache_models::VideoId) -> Option<Artifact> {
        if let Ok(Some(hint)) = self.coordinator.get_best_time(video_id).await {
            if let Ok(seconds) = hint.parse::<f64>() {
                if let Ok(time) = thumbcache_models::TimeOffset::parse(seconds) {
                    let fp = Fingerprint::new(video_id.clone(), time);
                    if let Some(artifact) = self.try_read(&fp).await {
                        return Some(artifact);
                    }
                }
            }
        }

        let latest = self.storage.list_latest(video_id).await.ok()?;
        let fp = Fingerprint::new(video_id.clone(), latest.offset);
        self.try_read(&fp).await
    }

    /// Wait budget exposed for callers that want to log it; not otherwise
    /// used outside this module.
    pub fn sync_wait_timeout(&self) -> Duration {
        self.config.timeout_before_async_generation()
    }
}
