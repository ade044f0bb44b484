//! Best-Time Hint: per-video offset to serve for "any recent thumbnail".

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::best_time_key;
use thumbcache_models::{TimeOffset, VideoId};

impl CoordinatorStore {
    pub async fn set_best_time(&self, video_id: &VideoId, time: TimeOffset) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn
            .set(best_time_key(video_id), time.canonical())
            .await?;
        Ok(())
    }

    pub async fn get_best_time(&self, video_id: &VideoId) -> CoordinatorResult<Option<String>> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(best_time_key(video_id)).await?;
        Ok(value)
    }
}
