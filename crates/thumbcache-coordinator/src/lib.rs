//! Typed client over the shared Redis coordinator store.
//!
//! This crate is a thin, typed wrapper around a handful of keys in one
//! Redis instance: the Recency Index (sorted set), the Storage Counter
//! (integer), the Best-Time Hint (string per video), two priority job
//! queues plus a per-fingerprint dedup marker, a job-completion pub/sub
//! channel per fingerprint, and the refreshed proxy pool cache. None of
//! these are collections in their own right - they're all views over
//! [`CoordinatorStore`], split into modules by concern.

pub mod best_time;
pub mod client;
pub mod counter;
pub mod error;
pub mod jobs;
pub mod keys;
pub mod proxy_cache;
pub mod recency;
pub mod status;
pub mod workers;

pub use client::{CoordinatorConfig, CoordinatorStore};
pub use error::{CoordinatorError, CoordinatorResult};
pub use jobs::JOB_DEDUP_TTL_SECS;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_uses_configured_host_and_port() {
        let config = CoordinatorConfig {
            host: "redis.internal".to_string(),
            port: 6380,
        };
        assert_eq!(config.redis_url(), "redis://redis.internal:6380");
    }

    #[test]
    fn default_config_matches_local_dev_redis() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.redis_url(), "redis://localhost:32774");
    }
}
