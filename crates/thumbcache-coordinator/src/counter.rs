//! Storage Counter: a single integer tracking total bytes written since the
//! last full recomputation.

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::STORAGE_USED_KEY;

impl CoordinatorStore {
    pub async fn add_storage(&self, delta: i64) -> CoordinatorResult<i64> {
        let mut conn = self.connection().await?;
        let total: i64 = conn.incr(STORAGE_USED_KEY, delta).await?;
        Ok(total)
    }

    pub async fn read_storage(&self) -> CoordinatorResult<u64> {
        let mut conn = self.connection().await?;
        let value: Option<i64> = conn.get(STORAGE_USED_KEY).await?;
        Ok(value.unwrap_or(0).max(0) as u64)
    }

    pub async fn reset_storage(&self, bytes: u64) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(STORAGE_USED_KEY, bytes as i64).await?;
        Ok(())
    }
}
