//! Errors from the frame-extractor subprocess and the livestream segment
//! downloader.

use thiserror::Error;

pub type ExtractorResult<T> = Result<T, ExtractorError>;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extractor binary not found on PATH: {0}")]
    BinaryNotFound(which::Error),

    #[error("failed to spawn extractor subprocess: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("extractor exceeded its {0:?} timeout and was killed")]
    Timeout(std::time::Duration),

    #[error("extractor exited with status {0}")]
    NonZeroExit(std::process::ExitStatus),

    #[error("failed to download livestream segment: {0}")]
    DownloadFailed(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
