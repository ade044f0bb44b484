//! The single YAML configuration shared by the `thumbcache-api` and
//! `thumbcache-worker` binaries.
//!
//! Loading goes through the `config` crate so a `config.yaml` on disk and
//! `THUMBCACHE__*` environment variables (double underscore separating
//! nested keys, e.g. `THUMBCACHE__THUMBNAIL_STORAGE__MAX_SIZE_BYTES`) layer
//! over the same defaults. Both binaries call [`AppConfig::load`] once at
//! startup and pass the resulting value down explicitly - nothing here is a
//! global singleton.

mod proxy;
mod sections;

pub use proxy::ProxyEntry;
pub use sections::{
    NsigHelperTransport, NsigHelperConfig, ServerConfig, ThumbnailStorageConfig, YtAuthConfig,
};

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Environment variable naming the coordinator-store (Redis) host. Reused as
/// a plain struct rather than pulling `thumbcache-coordinator` in as a
/// dependency, since this crate is loaded by both the API and the worker
/// before either builds its own coordinator client.
#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorAddress {
    #[serde(default = "default_coordinator_host")]
    pub host: String,
    #[serde(default = "default_coordinator_port")]
    pub port: u16,
}

impl Default for CoordinatorAddress {
    fn default() -> Self {
        Self {
            host: default_coordinator_host(),
            port: default_coordinator_port(),
        }
    }
}

fn default_coordinator_host() -> String {
    "localhost".to_string()
}

fn default_coordinator_port() -> u16 {
    32774
}

/// Full application configuration, one YAML document enumerating every
/// knob named in the system's external interfaces.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub thumbnail_storage: ThumbnailStorageConfig,
    #[serde(default)]
    pub coordinator: CoordinatorAddress,
    #[serde(default)]
    pub yt_auth: YtAuthConfig,

    #[serde(default = "default_max_height")]
    pub default_max_height: u32,

    /// Shared bearer token privileged endpoints (`/status`) require.
    #[serde(default)]
    pub status_auth_token: Option<String>,

    #[serde(default = "default_true")]
    pub try_floatie: bool,
    #[serde(default = "default_true")]
    pub try_ytdlp: bool,
    /// Only use proxies to run the frame extractor; never hit the origin
    /// directly even when no proxy failure has been observed yet.
    #[serde(default)]
    pub skip_local_extractor: bool,

    /// Static proxy pool. Mutually exclusive in practice with
    /// `proxy_token` (the static list wins if both are set).
    #[serde(default)]
    pub proxy_urls: Option<Vec<ProxyEntry>>,
    /// Webshare.io-style API token used to refresh a remote proxy pool.
    #[serde(default)]
    pub proxy_token: Option<String>,

    /// Front-end auth token: requests bearing it get the `high` priority
    /// queue instead of `normal`.
    #[serde(default)]
    pub front_auth: Option<String>,

    #[serde(default)]
    pub unique_hostnames: bool,
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_project_url")]
    pub project_url: String,
}

fn default_max_height() -> u32 {
    720
}

fn default_true() -> bool {
    true
}

fn default_project_url() -> String {
    "https://github.com/ajayyy/DeArrowThumbnailCache".to_string()
}

impl AppConfig {
    /// Load from `path` (defaulting to `config.yaml` in the working
    /// directory) layered with `THUMBCACHE__*` environment overrides. A
    /// missing file is not an error - every field has a default - but a
    /// present, malformed one is.
    pub fn load(path: Option<&str>) -> ConfigResult<Self> {
        let path = path.unwrap_or("config.yaml");
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("THUMBCACHE")
                    .separator("__")
                    .try_parsing(true),
            );
        let loaded = builder.build()?;
        Ok(loaded.try_deserialize()?)
    }

    /// The worker identity threaded through queue consumer names and log
    /// lines: the raw hostname when `unique_hostnames` is set (operator
    /// guarantees uniqueness, e.g. one pod per node), otherwise the
    /// hostname with a random suffix to disambiguate replicas that share
    /// one.
    pub fn worker_name(&self) -> String {
        let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "worker".to_string());
        if self.unique_hostnames {
            hostname
        } else {
            format!("{hostname}-{}", random_hex(4))
        }
    }

    pub fn cache_root(&self) -> PathBuf {
        self.thumbnail_storage.path.clone()
    }
}

fn random_hex(length: usize) -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| format!("{:x}", rng.gen_range(0..16u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_upstream_config_without_a_file_present() {
        let config = AppConfig::load(Some("/nonexistent/config.yaml")).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.thumbnail_storage.max_size_bytes, 50 * 1024 * 1024);
        assert_eq!(config.thumbnail_storage.cleanup_multiplier, 0.5);
        assert!(config.try_floatie);
        assert!(config.try_ytdlp);
        assert_eq!(config.coordinator.port, 32774);
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "thumbnail_storage:\n  max_size_bytes: 123456\nfront_auth: secret-token\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.thumbnail_storage.max_size_bytes, 123456);
        assert_eq!(config.front_auth.as_deref(), Some("secret-token"));
    }

    #[test]
    fn worker_name_respects_unique_hostnames_flag() {
        let mut config = AppConfig::load(Some("/nonexistent/config.yaml")).unwrap();
        config.unique_hostnames = true;
        std::env::set_var("HOSTNAME", "worker-7");
        assert_eq!(config.worker_name(), "worker-7");

        config.unique_hostnames = false;
        assert!(config.worker_name().starts_with("worker-7-"));
    }
}
