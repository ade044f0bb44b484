//! Worker runtime configuration: the shared [`thumbcache_config::AppConfig`]
//! plus the handful of knobs that only make sense inside a worker process
//! (the tempdir used for livestream segment downloads, the extractor log
//! directory, and how many jobs this process runs concurrently).

use std::path::PathBuf;

use thumbcache_config::AppConfig;

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub app: AppConfig,
    /// One worker process runs exactly one job at a time (§5); this isn't
    /// a tunable, it documents the invariant the executor relies on.
    pub max_concurrent_jobs: usize,
    pub work_dir: PathBuf,
    pub extractor_log_dir: PathBuf,
}

impl WorkerConfig {
    pub fn from_app_config(app: AppConfig) -> Self {
        let work_dir = std::env::var("THUMBCACHE_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("thumbcache-worker"));
        let extractor_log_dir = work_dir.join("logs");
        Self {
            app,
            max_concurrent_jobs: 1,
            work_dir,
            extractor_log_dir,
        }
    }
}
