//! The nested sections of [`crate::AppConfig`], one struct per YAML table.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_worker_health_port")]
    pub worker_health_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_health_port: default_worker_health_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_worker_health_port() -> u16 {
    3002
}

/// The on-disk cache's size budget and eviction knobs (§4.E Cleanup loop).
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailStorageConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Bytes at which a cleanup pass is triggered.
    #[serde(default = "default_max_size_bytes")]
    pub max_size_bytes: u64,
    /// Target occupancy after cleanup, as a fraction of `max_size_bytes`.
    #[serde(default = "default_cleanup_multiplier")]
    pub cleanup_multiplier: f64,
    /// Folders found on disk but missing from the recency index are
    /// tolerated up to this count before cleanup deletes them outright.
    #[serde(default = "default_redis_offset_allowed")]
    pub redis_offset_allowed: u32,
    #[serde(default = "default_max_before_async")]
    pub max_before_async_generation: u32,
    #[serde(default = "default_timeout_before_async_secs")]
    pub timeout_before_async_generation_secs: u64,
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: u64,
    /// How often the reconciliation pass runs regardless of the storage
    /// counter, to self-heal counter drift.
    #[serde(default = "default_reconcile_interval_secs")]
    pub reconcile_interval_secs: u64,
}

impl Default for ThumbnailStorageConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_size_bytes: default_max_size_bytes(),
            cleanup_multiplier: default_cleanup_multiplier(),
            redis_offset_allowed: default_redis_offset_allowed(),
            max_before_async_generation: default_max_before_async(),
            timeout_before_async_generation_secs: default_timeout_before_async_secs(),
            max_queue_size: default_max_queue_size(),
            reconcile_interval_secs: default_reconcile_interval_secs(),
        }
    }
}

impl ThumbnailStorageConfig {
    pub fn timeout_before_async_generation(&self) -> Duration {
        Duration::from_secs(self.timeout_before_async_generation_secs)
    }

    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn cleanup_target_bytes(&self) -> u64 {
        (self.max_size_bytes as f64 * self.cleanup_multiplier) as u64
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("cache")
}

fn default_max_size_bytes() -> u64 {
    50 * 1024 * 1024
}

fn default_cleanup_multiplier() -> f64 {
    0.5
}

fn default_redis_offset_allowed() -> u32 {
    20
}

fn default_max_before_async() -> u32 {
    15
}

fn default_timeout_before_async_secs() -> u64 {
    15
}

fn default_max_queue_size() -> u64 {
    10_000
}

fn default_reconcile_interval_secs() -> u64 {
    600
}

/// Address of the signing-helper subprocess (§6 binary protocol): either a
/// TCP host/port or a Unix domain socket path, never both.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NsigHelperTransport {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
pub struct NsigHelperConfig {
    pub transport: Option<NsigHelperTransport>,
    #[serde(default = "default_max_player_age_secs")]
    pub max_player_age_secs: u64,
}

impl Default for NsigHelperConfig {
    fn default() -> Self {
        Self {
            transport: None,
            max_player_age_secs: default_max_player_age_secs(),
        }
    }
}

impl NsigHelperConfig {
    pub fn max_player_age(&self) -> Duration {
        Duration::from_secs(self.max_player_age_secs)
    }
}

fn default_max_player_age_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct YtAuthConfig {
    #[serde(default)]
    pub visitor_data: Option<String>,
    #[serde(default)]
    pub po_token: Option<String>,
    #[serde(default)]
    pub nsig_helper: NsigHelperConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_target_is_multiplier_of_max_size() {
        let storage = ThumbnailStorageConfig {
            max_size_bytes: 100_000,
            cleanup_multiplier: 0.5,
            ..ThumbnailStorageConfig::default()
        };
        assert_eq!(storage.cleanup_target_bytes(), 50_000);
    }
}
