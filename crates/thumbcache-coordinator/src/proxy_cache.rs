//! Cache for the remote-refreshed proxy pool: the fetched list plus the
//! rate-limit bookkeeping that decides when the next fetch is due.

use redis::AsyncCommands;

use crate::client::CoordinatorStore;
use crate::error::CoordinatorResult;
use crate::keys::{LAST_PROXY_FETCH_KEY, NEXT_PROXY_FETCH_KEY, PROXIES_KEY};
use thumbcache_models::ProxyInfo;

impl CoordinatorStore {
    pub async fn get_cached_proxies(&self) -> CoordinatorResult<Vec<ProxyInfo>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(PROXIES_KEY).await?;
        match raw {
            Some(raw) if !raw.is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Ok(Vec::new()),
        }
    }

    pub async fn set_cached_proxies(&self, proxies: &[ProxyInfo]) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let encoded = serde_json::to_string(proxies)?;
        let _: () = conn.set(PROXIES_KEY, encoded).await?;
        Ok(())
    }

    pub async fn get_last_proxy_fetch(&self) -> CoordinatorResult<f64> {
        let mut conn = self.connection().await?;
        let value: Option<f64> = conn.get(LAST_PROXY_FETCH_KEY).await?;
        Ok(value.unwrap_or(0.0))
    }

    pub async fn set_last_proxy_fetch(&self, unix_seconds: f64) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(LAST_PROXY_FETCH_KEY, unix_seconds).await?;
        Ok(())
    }

    pub async fn get_next_proxy_wait(&self) -> CoordinatorResult<f64> {
        let mut conn = self.connection().await?;
        let value: Option<f64> = conn.get(NEXT_PROXY_FETCH_KEY).await?;
        Ok(value.unwrap_or(0.0))
    }

    pub async fn set_next_proxy_wait(&self, seconds: f64) -> CoordinatorResult<()> {
        let mut conn = self.connection().await?;
        let _: () = conn.set(NEXT_PROXY_FETCH_KEY, seconds).await?;
        Ok(())
    }
}
