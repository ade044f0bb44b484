//! Cleanup Loop (§4.E): the size-bounded eviction pass that keeps the
//! on-disk cache under budget, LRU-ordered by the coordinator store's
//! Recency Index rather than filesystem mtime.
//!
//! Runs as a background task in the request process (§9: "the async
//! variant only in the request process"). A short fixed tick checks
//! whether the storage counter has crossed `max_size_bytes`; independently,
//! a full reconciliation sweep runs every `reconcile_interval_secs`
//! regardless, to self-heal counter drift left behind by crashes.

use std::path::Path;
use std::time::{Duration, Instant};

use thumbcache_config::ThumbnailStorageConfig;
use thumbcache_coordinator::CoordinatorStore;
use thumbcache_models::VideoId;
use thumbcache_storage::ArtifactStore;
use tracing::{debug, info, warn};

/// How often the loop wakes to check the storage counter against
/// `max_size_bytes`. Independent of `reconcile_interval_secs`, which
/// governs the unconditional full-reconciliation pass.
const TICK_INTERVAL: Duration = Duration::from_secs(10);

/// A video whose recency score is newer than this is assumed to have an
/// in-flight generator and is skipped by a sweep, even if it would
/// otherwise be the oldest entry (§4.E: "never deletes a video whose
/// recency score is within the active window").
const ACTIVE_WINDOW_SECS: i64 = 5;

/// How many LRU entries a single sweep pulls per batch from the index.
const LRU_BATCH_SIZE: usize = 50;

#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub videos_deleted: u64,
    pub bytes_reclaimed: u64,
    pub drift_folders_deleted: u64,
}

pub struct CleanupLoop {
    storage: ArtifactStore,
    coordinator: CoordinatorStore,
    config: ThumbnailStorageConfig,
}

impl CleanupLoop {
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

    /// Runs forever. Intended to be `tokio::spawn`ed once at startup.
    pub async fn run(self) {
        let mut last_reconcile = Instant::now();
        loop {
            tokio::time::sleep(TICK_INTERVAL).await;

            let due_for_reconcile = last_reconcile.elapsed() >= self.config.reconcile_interval();

            let over_budget = match self.coordinator.read_storage().await {
                Ok(bytes) => bytes > self.config.max_size_bytes,
                Err(e) => {
                    warn!(error = %e, "failed to read storage counter");
                    false
                }
            };

            if over_budget || due_for_reconcile {
                info!(over_budget, due_for_reconcile, "running cleanup sweep");
                match self.sweep().await {
                    Ok(report) => info!(
                        videos_deleted = report.videos_deleted,
                        bytes_reclaimed = report.bytes_reclaimed,
                        drift_folders_deleted = report.drift_folders_deleted,
                        "cleanup sweep complete"
                    ),
                    Err(e) => warn!(error = %e, "cleanup sweep failed"),
                }
                last_reconcile = Instant::now();
            }
        }
    }

    /// §4.E steps 1-5.
    pub async fn sweep(&self) -> thumbcache_storage::StorageResult<SweepReport> {
        let started = Instant::now();
        let target = self.config.cleanup_target_bytes();
        let mut report = SweepReport::default();

        loop {
            let current = self.coordinator.read_storage().await.unwrap_or(u64::MAX);
            if current <= target {
                break;
            }

            let window = self
                .coordinator
                .get_lru_window(LRU_BATCH_SIZE)
                .await
                .unwrap_or_default();
            if window.is_empty() {
                break;
            }

            let mut made_progress = false;
            for raw_id in window {
                let Ok(video_id) = VideoId::parse(&raw_id) else {
                    warn!(raw_id, "recency index contains a malformed video id, skipping");
                    continue;
                };

                if self.is_active(&video_id).await {
                    continue;
                }

                match self.delete_one(&video_id).await {
                    Ok(bytes) => {
                        report.videos_deleted += 1;
                        report.bytes_reclaimed += bytes;
                        made_progress = true;
                    }
                    Err(e) => {
                        warn!(error = %e, video_id = %video_id, "failed to delete video during cleanup, skipping");
                    }
                }

                if self.coordinator.read_storage().await.unwrap_or(u64::MAX) <= target {
                    break;
                }
            }

            if !made_progress {
                // Every entry in this batch was active or failed to
                // delete; stop rather than spin on the same window.
                break;
            }
        }

        // Step 4: drift beyond the tolerated allowance.
        let folder_size = self.storage.folder_size(self.cache_root()).await?;
        if folder_size.bytes > target {
            report.drift_folders_deleted += self.delete_drift_folders(target).await?;
        }

        // Step 5: recompute from an authoritative walk (self-healing).
        let final_size = self.storage.folder_size(self.cache_root()).await?;
        if let Err(e) = self.coordinator.reset_storage(final_size.bytes).await {
            warn!(error = %e, "failed to reset storage counter after cleanup");
        }

        crate::metrics::record_cleanup_sweep(
            started.elapsed().as_secs_f64(),
            report.videos_deleted,
            report.bytes_reclaimed,
        );

        Ok(report)
    }

    fn cache_root(&self) -> &Path {
        &self.config.path
    }

    async fn is_active(&self, video_id: &VideoId) -> bool {
        match self.coordinator.get_last_used(video_id).await {
            Ok(Some(score)) => {
                let now = chrono::Utc::now().timestamp();
                now - score < ACTIVE_WINDOW_SECS
            }
            _ => false,
        }
    }

    async fn delete_one(&self, video_id: &VideoId) -> thumbcache_storage::StorageResult<u64> {
        let folder = self.storage.folder_path(video_id);
        let size = self.storage.folder_size(&folder).await?.bytes;
        self.storage.delete_video(video_id).await?;
        let _ = self.coordinator.remove_from_index(video_id).await;
        let _ = self.coordinator.add_storage(-(size as i64)).await;
        debug!(video_id = %video_id, bytes = size, "cleanup deleted video");
        Ok(size)
    }

    /// Folders on disk with no Recency Index entry (crash drift), beyond
    /// the tolerated count, deleted oldest-mtime-first.
    async fn delete_drift_folders(&self, target: u64) -> thumbcache_storage::StorageResult<u64> {
        let on_disk = self.storage.list_video_ids().await?;
        let mut orphans = Vec::new();
        for raw_id in on_disk {
            let Ok(video_id) = VideoId::parse(&raw_id) else {
                continue;
            };
            if matches!(self.coordinator.get_last_used(&video_id).await, Ok(None)) {
                let folder = self.storage.folder_path(&video_id);
                let mtime = tokio::fs::metadata(&folder)
                    .await
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::UNIX_EPOCH);
                orphans.push((video_id, mtime));
            }
        }

        if orphans.len() <= self.config.redis_offset_allowed as usize {
            return Ok(0);
        }

        orphans.sort_by_key(|(_, mtime)| *mtime);
        let evictable = orphans.len() - self.config.redis_offset_allowed as usize;

        let mut deleted = 0u64;
        for (video_id, _) in orphans.into_iter().take(evictable) {
            if self.delete_one(&video_id).await.is_ok() {
                deleted += 1;
            }
            if self.storage.folder_size(self.cache_root()).await?.bytes <= target {
                break;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_window_is_a_few_seconds_not_the_full_reconcile_interval() {
        // Sanity check the two timescales this module juggles don't get
        // confused with each other: the active window that protects an
        // in-flight generator is seconds, the reconcile cadence is minutes.
        assert!(ACTIVE_WINDOW_SECS < 60);
    }
}
