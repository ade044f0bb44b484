//! Invokes the `extractor` subprocess (§6) to pull a single frame out of a
//! remote or local media source. All stdio is redirected to a
//! per-invocation log file; a non-zero exit is the only failure signal
//! consumed, and the 20-second hard timeout is enforced here rather than
//! trusted to the child.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::warn;

use crate::error::{ExtractorError, ExtractorResult};

const HARD_TIMEOUT: Duration = Duration::from_secs(20);

pub struct FrameExtractor {
    binary: PathBuf,
    log_dir: PathBuf,
}

impl FrameExtractor {
    /// Resolve the `extractor` binary from `PATH` once at startup; every
    /// call afterwards reuses the resolved path.
    pub fn discover(log_dir: impl Into<PathBuf>) -> ExtractorResult<Self> {
        let binary = which::which("extractor").map_err(ExtractorError::BinaryNotFound)?;
        Ok(Self {
            binary,
            log_dir: log_dir.into(),
        })
    }

    pub fn with_binary(binary: impl Into<PathBuf>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            log_dir: log_dir.into(),
        }
    }

    /// Extract one frame at `time_offset` seconds from `source` into
    /// `output_path`, optionally routed through `http_proxy`.
    pub async fn extract_frame(
        &self,
        source: &str,
        time_offset: f64,
        output_path: &Path,
        http_proxy: Option<&str>,
    ) -> ExtractorResult<()> {
        std::fs::create_dir_all(&self.log_dir)?;
        let log_path = self
            .log_dir
            .join(format!("extractor-{}.log", now_millis()));
        let log_file = std::fs::File::create(&log_path)?;
        let log_file_err = log_file.try_clone()?;

        let mut command = Command::new(&self.binary);
        command.arg("-y");
        if let Some(proxy) = http_proxy {
            command.arg("-http_proxy").arg(proxy);
        }
        command
            .arg("-ss")
            .arg(format!("{time_offset}"))
            .arg("-i")
            .arg(source)
            .arg("-vframes")
            .arg("1")
            .arg("-lossless")
            .arg("0")
            .arg("-pix_fmt")
            .arg("bgra")
            .arg(output_path)
            .arg("-timelimit")
            .arg("20")
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err));

        let mut child = command.spawn().map_err(ExtractorError::Spawn)?;

        let wait = tokio::time::timeout(HARD_TIMEOUT, child.wait()).await;
        let status = match wait {
            Ok(status) => status?,
            Err(_) => {
                let _ = child.kill().await;
                return Err(ExtractorError::Timeout(HARD_TIMEOUT));
            }
        };

        if !status.success() {
            warn!(log = %log_path.display(), "extractor exited non-zero, log retained");
            return Err(ExtractorError::NonZeroExit(status));
        }

        // Only successful runs get their log cleaned up; a failing one is
        // left behind for inspection.
        if let Err(e) = std::fs::remove_file(&log_path) {
            warn!(error = %e, "failed to remove extractor log after success");
        }

        Ok(())
    }
}

fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fake "extractor" that writes a fixed-size file and exits with a
    /// configurable code, to exercise the timeout/non-zero-exit paths
    /// without a real decoder on hand.
    fn fake_extractor_script(dir: &Path, exit_code: i32, sleep_secs: u64) -> PathBuf {
        let script_path = dir.join("extractor");
        std::fs::write(
            &script_path,
            format!("#!/bin/sh\nsleep {sleep_secs}\nexit {exit_code}\n"),
        )
        .unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&script_path).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&script_path, perms).unwrap();
        }
        script_path
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_and_log_retained() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let binary = fake_extractor_script(dir.path(), 1, 0);

        let extractor = FrameExtractor::with_binary(binary, &logs);
        let out = dir.path().join("out.webp");
        let result = extractor
            .extract_frame("https://example.com/video", 5.3, &out, None)
            .await;

        assert!(matches!(result, Err(ExtractorError::NonZeroExit(_))));
        let remaining_logs: Vec<_> = std::fs::read_dir(&logs).unwrap().collect();
        assert_eq!(remaining_logs.len(), 1);
    }

    #[tokio::test]
    async fn successful_run_removes_its_log() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let binary = fake_extractor_script(dir.path(), 0, 0);

        let extractor = FrameExtractor::with_binary(binary, &logs);
        let out = dir.path().join("out.webp");
        extractor
            .extract_frame("https://example.com/video", 5.3, &out, None)
            .await
            .unwrap();

        let remaining_logs: Vec<_> = std::fs::read_dir(&logs).unwrap().collect();
        assert!(remaining_logs.is_empty());
    }
}
