//! Structured job logging: stamps every line with the fingerprint's job
//! id and the current operation, and exposes a tracing span for call
//! sites that want to attach more structured data.

use tracing::{error, info, warn, Span};

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            operation: operation.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "job started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "job progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, operation = %self.operation, "job warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(job_id = %self.job_id, operation = %self.operation, "job error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(job_id = %self.job_id, operation = %self.operation, "job completed: {}", message);
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id, operation = %self.operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_job_id_and_operation_through() {
        let logger = JobLogger::new("jNQXAC9IVRw-5.3", "generate");
        assert_eq!(logger.job_id(), "jNQXAC9IVRw-5.3");
        assert_eq!(logger.operation(), "generate");
    }
}
