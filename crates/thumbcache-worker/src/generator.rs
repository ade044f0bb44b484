//! Generator (§4.D): produces an artifact for a fingerprint by resolving a
//! playback URL, invoking the frame extractor (or, for livestreams,
//! downloading a segment and decoding it locally), validating the result,
//! and recording it through the artifact store and coordinator.

use std::path::PathBuf;

use thumbcache_coordinator::CoordinatorStore;
use thumbcache_extractor::{download_segment, FrameExtractor};
use thumbcache_models::{Artifact, Fingerprint, TimeOffset, MIN_ARTIFACT_BYTES};
use thumbcache_resolver::Resolver;
use thumbcache_storage::ArtifactStore;
use tracing::{info, warn};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::retry::{retry_async, retry_async_if, RetryConfig, RetryResult};

/// Number of attempts the status publication gets (§7: "retried up to 5
/// times with exponential backoff because waiters depend on it").
const STATUS_PUBLISH_RETRIES: u32 = 5;

pub struct GeneratorConfig {
    pub skip_local_extractor: bool,
    pub storage_max_size_bytes: u64,
}

pub struct Generator {
    storage: ArtifactStore,
    coordinator: CoordinatorStore,
    resolver: Resolver,
    extractor: FrameExtractor,
    http: reqwest::Client,
    work_dir: PathBuf,
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(
        storage: ArtifactStore,
        coordinator: CoordinatorStore,
        resolver: Resolver,
        extractor: FrameExtractor,
        work_dir: PathBuf,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            storage,
            coordinator,
            resolver,
            extractor,
            http: reqwest::Client::new(),
            work_dir,
            config,
        }
    }

    /// Entry point. Retries the whole attempt once on a generation failure
    /// (undersized output or extractor failure); every other error class
    /// propagates immediately, matching the single `ThumbnailGenerationError`
    /// retry the upstream generator wraps around itself.
    pub async fn generate(
        &self,
        fp: &Fingerprint,
        title: Option<String>,
        update_index: bool,
        is_livestream: bool,
    ) -> WorkerResult<()> {
        let logger = JobLogger::new(fp.job_id(), "generate");
        logger.log_start("beginning generation");

        let retry_config = RetryConfig::new("generate_thumbnail")
            .with_max_retries(1)
            .with_base_delay(std::time::Duration::from_secs(1));

        let result = retry_async_if(
            &retry_config,
            || self.generate_once(fp, title.as_deref(), update_index, is_livestream, &logger),
            WorkerError::is_retryable_generation_failure,
        )
        .await;

        match result {
            RetryResult::Success(()) => {
                logger.log_completion("generation succeeded");
                self.publish_status_with_retry(fp, true).await;
                self.maybe_trigger_cleanup().await;
                Ok(())
            }
            RetryResult::Failed { error, .. } => {
                logger.log_error(&format!("generation failed permanently: {error}"));
                self.publish_status_with_retry(fp, false).await;
                Err(error)
            }
        }
    }

    async fn generate_once(
        &self,
        fp: &Fingerprint,
        title: Option<&str>,
        update_index: bool,
        is_livestream: bool,
        logger: &JobLogger,
    ) -> WorkerResult<()> {
        if update_index {
            if let Err(e) = self.coordinator.update_last_used(&fp.video_id).await {
                logger.log_warning(&format!("failed to update recency index: {e}"));
            }
        }

        let resolved = self.resolver.resolve(&fp.video_id).await?;
        let fps = resolved.playback.fps;

        // Round down to the nearest real frame; 60fps feeds get an extra
        // 1/100s floor to compensate for decoder rounding that otherwise
        // lands on the adjacent frame.
        let mut rounded_time = (fp.time.seconds() * fps).floor() / fps;
        if (fps - 60.0).abs() < f64::EPSILON {
            rounded_time = (rounded_time - 0.01).max(0.0);
        }

        let output_path = self.work_dir.join(format!("{}.webp", fp.job_id()));
        tokio::fs::create_dir_all(&self.work_dir).await?;

        let proxy_url = resolved.proxy.as_ref().map(|p| p.url.clone());

        if is_livestream {
            self.generate_livestream(
                &resolved.playback.url,
                proxy_url.as_deref(),
                rounded_time,
                &output_path,
            )
            .await?;
        } else {
            self.generate_remote(
                &resolved.playback.url,
                proxy_url.as_deref(),
                rounded_time,
                &output_path,
                logger,
            )
            .await?;
        }

        let image = tokio::fs::read(&output_path).await?;
        let _ = tokio::fs::remove_file(&output_path).await;

        if image.len() < MIN_ARTIFACT_BYTES {
            return Err(WorkerError::UndersizedOutput);
        }

        let artifact = Artifact {
            image,
            offset: fp.time,
            title: title.map(str::to_string),
        };

        self.storage
            .write(fp, &artifact.image, artifact.title.as_deref(), is_livestream)
            .await?;

        match self.coordinator.add_storage(artifact.storage_delta() as i64).await {
            Ok(_) => {}
            Err(e) => logger.log_warning(&format!("failed to update storage counter: {e}")),
        }

        Ok(())
    }

    /// Non-livestream branch: hand the remote URL straight to the
    /// extractor. On failure, retry once with the proxy inserted if one
    /// wasn't already used for the decode.
    async fn generate_remote(
        &self,
        source_url: &str,
        proxy_url: Option<&str>,
        rounded_time: f64,
        output_path: &std::path::Path,
        logger: &JobLogger,
    ) -> WorkerResult<()> {
        let http_proxy = if self.config.skip_local_extractor {
            proxy_url
        } else {
            None
        };

        let first_attempt = self
            .extractor
            .extract_frame(source_url, rounded_time, output_path, http_proxy)
            .await;

        match first_attempt {
            Ok(()) => Ok(()),
            Err(e) if http_proxy.is_none() && proxy_url.is_some() => {
                logger.log_warning(&format!(
                    "extractor failed without proxy ({e}), retrying through proxy"
                ));
                self.extractor
                    .extract_frame(source_url, rounded_time, output_path, proxy_url)
                    .await
                    .map_err(|e| WorkerError::ThumbnailGeneration(e.to_string()))
            }
            Err(e) => Err(WorkerError::ThumbnailGeneration(e.to_string())),
        }
    }

    /// Livestream branch: download the segment to a temp file with a
    /// 5-second HTTP timeout, then run the extractor against the local
    /// file. The temp file is cleaned up on every exit path.
    async fn generate_livestream(
        &self,
        source_url: &str,
        proxy_url: Option<&str>,
        rounded_time: f64,
        output_path: &std::path::Path,
    ) -> WorkerResult<()> {
        let segment_path = self.work_dir.join(format!(
            "segment-{}.ts",
            uuid::Uuid::new_v4()
        ));

        let download_result = download_segment(&self.http, source_url, proxy_url, &segment_path).await;
        let extract_result = match &download_result {
            Ok(()) => {
                let local_source = segment_path.to_string_lossy().to_string();
                self.extractor
                    .extract_frame(&local_source, rounded_time, output_path, None)
                    .await
            }
            Err(e) => Err(thumbcache_extractor::ExtractorError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                e.to_string(),
            ))),
        };

        let _ = tokio::fs::remove_file(&segment_path).await;

        download_result.map_err(|e| WorkerError::ThumbnailGeneration(e.to_string()))?;
        extract_result.map_err(|e| WorkerError::ThumbnailGeneration(e.to_string()))
    }

    async fn publish_status_with_retry(&self, fp: &Fingerprint, success: bool) {
        let retry_config = RetryConfig::new("publish_status")
            .with_max_retries(STATUS_PUBLISH_RETRIES)
            .with_base_delay(std::time::Duration::from_millis(100));

        let result = retry_async(&retry_config, || self.coordinator.publish_status(fp, success)).await;
        if let RetryResult::Failed { error, attempts } = result {
            warn!(fingerprint = %fp, attempts, error = %error, "failed to publish job status after retries");
        }
    }

    async fn maybe_trigger_cleanup(&self) {
        match self.coordinator.read_storage().await {
            Ok(bytes) if bytes > self.config.storage_max_size_bytes => {
                info!(bytes, max = self.config.storage_max_size_bytes, "storage over threshold, cleanup pass needed");
                // The actual sweep is owned by the request-process's
                // background cleanup loop; this just logs the trigger so
                // operators can correlate writes with the next pass.
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to read storage counter for cleanup check"),
        }
    }
}

/// Reject invalid inputs before any I/O, per §4.D step 1.
pub fn validate_time_offset(seconds: f64) -> WorkerResult<TimeOffset> {
    TimeOffset::parse(seconds).map_err(|e| WorkerError::InputInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_finite_offsets() {
        assert!(validate_time_offset(f64::NAN).is_err());
        assert!(validate_time_offset(-1.0).is_err());
    }

    #[test]
    fn accepts_well_formed_offsets() {
        assert!(validate_time_offset(5.3).is_ok());
    }
}
