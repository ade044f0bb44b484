//! Recency Index: `video-id -> last-used-unix-seconds`, a Redis sorted set.

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::LAST_USED_KEY;
use thumbcache_models::VideoId;

impl CoordinatorStore {
    /// Set `video_id`'s recency score to now. Best-effort at every call
    /// site: failures are logged upstream, never fatal.
    pub async fn update_last_used(&self, video_id: &VideoId) -> CoordinatorResult<()> {
        let now = chrono::Utc::now().timestamp();
        let mut conn = self.connection().await?;
        conn.zadd::<_, _, _, ()>(LAST_USED_KEY, video_id.as_str(), now)
            .await?;
        Ok(())
    }

    /// The `n` oldest entries, ascending by score (oldest first).
    pub async fn get_lru_window(&self, n: usize) -> CoordinatorResult<Vec<String>> {
        let mut conn = self.connection().await?;
        let ids: Vec<String> = conn
            .zrange(LAST_USED_KEY, 0, n.saturating_sub(1) as isize)
            .await?;
        Ok(ids)
    }

    /// Recency score for a single video id, if present.
    pub async fn get_last_used(&self, video_id: &VideoId) -> CoordinatorResult<Option<i64>> {
        let mut conn = self.connection().await?;
        let score: Option<i64> = conn.zscore(LAST_USED_KEY, video_id.as_str()).await?;
        Ok(score)
    }

    pub async fn remove_from_index(&self, video_id: &VideoId) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.zrem(LAST_USED_KEY, video_id.as_str()).await?;
        Ok(())
    }

    pub async fn index_size(&self) -> CoordinatorResult<u64> {
        let mut conn = self.connection().await?;
        Ok(conn.zcard(LAST_USED_KEY).await?)
    }
}
