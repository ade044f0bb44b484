//! Coordinator-store key layout.

use thumbcache_models::{Fingerprint, VideoId};

pub const LAST_USED_KEY: &str = "last-used";
pub const STORAGE_USED_KEY: &str = "storage-used";
pub const PROXIES_KEY: &str = "proxies";
pub const LAST_PROXY_FETCH_KEY: &str = "last_proxy_fetch";
pub const NEXT_PROXY_FETCH_KEY: &str = "next_proxy_fetch";
pub const WORKER_HEARTBEATS_KEY: &str = "worker-heartbeats";

/// Dedup marker preventing a second job from being enqueued for a
/// fingerprint that already has one in flight.
pub fn job_exists_key(job_id: &str) -> String {
    format!("job-exists-{job_id}")
}

pub fn best_time_key(video_id: &VideoId) -> String {
    format!("best-{video_id}")
}

pub fn status_channel(fp: &Fingerprint) -> String {
    fp.job_id()
}
