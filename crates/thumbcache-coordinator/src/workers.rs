//! Worker liveness, surfaced by `GET /status`'s worker count (§6).
//!
//! `spec.md` names "worker count" as part of `/status` but never defines a
//! backing key for it. Resolved the same way the Recency Index already
//! works: a sorted set scored by last-seen unix time, one member per
//! worker. A worker not seen within [`ACTIVE_WINDOW_SECS`] no longer
//! counts, so a crashed worker disappears without anyone having to clean
//! up after it.

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::WORKER_HEARTBEATS_KEY;

/// A worker not heartbeating within this many seconds is considered gone.
pub const ACTIVE_WINDOW_SECS: i64 = 90;

impl CoordinatorStore {
    pub async fn heartbeat_worker(&self, name: &str) -> CoordinatorResult<()> {
        let now = chrono::Utc::now().timestamp();
        let mut conn = self.connection().await?;
        conn.zadd::<_, _, _, ()>(WORKER_HEARTBEATS_KEY, name, now)
            .await?;
        Ok(())
    }

    /// Workers heartbeated within [`ACTIVE_WINDOW_SECS`] of now.
    pub async fn active_worker_count(&self) -> CoordinatorResult<u64> {
        let now = chrono::Utc::now().timestamp();
        let mut conn = self.connection().await?;
        let count: u64 = conn
            .zcount(WORKER_HEARTBEATS_KEY, now - ACTIVE_WINDOW_SECS, now)
            .await?;
        Ok(count)
    }
}
