//! The two priority job queues plus the per-fingerprint dedup marker that
//! keeps at most one job alive per fingerprint at a time.

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::job_exists_key;
use thumbcache_models::{Fingerprint, Priority, QueuedJob};

/// How long a job's dedup marker survives if nothing ever clears it
/// (worker crash). Bounds how long a fingerprint can be stuck "in flight"
/// with no real job behind it.
pub const JOB_DEDUP_TTL_SECS: i64 = 3600;

impl CoordinatorStore {
    /// Atomically claim the right to enqueue a job for this fingerprint.
    /// Returns `true` if this call created the marker (caller should
    /// enqueue), `false` if one already existed (caller should attach to
    /// the existing job instead).
    pub async fn try_create_job(&self, fp: &Fingerprint) -> CoordinatorResult<bool> {
        let mut conn = self.connection().await?;
        let created: bool = redis::cmd("SET")
            .arg(job_exists_key(&fp.job_id()))
            .arg(1)
            .arg("NX")
            .arg("EX")
            .arg(JOB_DEDUP_TTL_SECS)
            .query_async::<Option<String>>(&mut conn)
            .await?
            .is_some();
        Ok(created)
    }

    pub async fn clear_job(&self, fp: &Fingerprint) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.del(job_exists_key(&fp.job_id())).await?;
        Ok(())
    }

    pub async fn enqueue_job(&self, priority: Priority, job: &QueuedJob) -> CoordinatorResult<()> {
        let payload = serde_json::to_string(job)?;
        let mut conn = self.connection().await?;
        let _: () = conn.rpush(priority.queue_name(), payload).await?;
        Ok(())
    }

    pub async fn queue_depth(&self, priority: Priority) -> CoordinatorResult<u64> {
        let mut conn = self.connection().await?;
        Ok(conn.llen(priority.queue_name()).await?)
    }

    pub async fn total_queue_depth(&self) -> CoordinatorResult<u64> {
        let mut total = 0;
        for priority in Priority::ALL {
            total += self.queue_depth(priority).await?;
        }
        Ok(total)
    }

    /// 0-based position of `fp`'s job within its priority queue, or `None`
    /// if it isn't queued (already claimed by a worker, or never enqueued).
    pub async fn position(&self, priority: Priority, fp: &Fingerprint) -> CoordinatorResult<Option<usize>> {
        let mut conn = self.connection().await?;
        let entries: Vec<String> = conn.lrange(priority.queue_name(), 0, -1).await?;
        for (idx, raw) in entries.iter().enumerate() {
            if let Ok(job) = serde_json::from_str::<QueuedJob>(raw) {
                if job.video_id == fp.video_id.as_str() && job.time == fp.time.seconds() {
                    return Ok(Some(idx));
                }
            }
        }
        Ok(None)
    }

    /// Pop the next job off a priority queue (workers consume oldest-first).
    pub async fn dequeue(&self, priority: Priority) -> CoordinatorResult<Option<QueuedJob>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.lpop(priority.queue_name(), None).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}
