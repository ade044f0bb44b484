//! Job executor (§5): one process, one job at a time. Polls the `high`
//! priority queue before `normal`, per the ordering the coordinator store's
//! queues are named for; an idle poll backs off briefly instead of busy
//! looping.

use std::time::Duration;

use thumbcache_coordinator::CoordinatorStore;
use thumbcache_models::{Fingerprint, Priority, QueuedJob, TimeOffset, VideoId};
use tracing::{error, info, warn};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::generator::Generator;

const IDLE_BACKOFF: Duration = Duration::from_millis(250);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);

pub struct JobExecutor {
    config: WorkerConfig,
    coordinator: CoordinatorStore,
    generator: Generator,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl JobExecutor {
    pub fn new(config: WorkerConfig, coordinator: CoordinatorStore, generator: Generator) -> Self {
        let (shutdown, _) = tokio::sync::watch::channel(false);
        Self {
            config,
            coordinator,
            generator,
            shutdown,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Runs until told to shut down. Exactly one job runs at a time (§5);
    /// there is no semaphore or spawned task here because this process
    /// *is* the concurrency unit.
    pub async fn run(&self) -> WorkerResult<()> {
        let worker_name = self.config.app.worker_name();
        info!(worker = %worker_name, "job executor starting");
        let mut shutdown_rx = self.shutdown.subscribe();

        let heartbeat_handle = {
            let coordinator = self.coordinator.clone();
            let mut shutdown_rx = shutdown_rx.clone();
            let name = worker_name.clone();
            tokio::spawn(async move {
                loop {
                    if let Err(e) = coordinator.heartbeat_worker(&name).await {
                        warn!(error = %e, "failed to publish worker heartbeat");
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {}
                        _ = shutdown_rx.changed() => break,
                    }
                }
            })
        };

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            let claimed = tokio::select! {
                _ = shutdown_rx.changed() => None,
                job = self.claim_next_job() => job,
            };

            match claimed {
                Some((priority, job)) => self.run_job(priority, job).await,
                None => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    tokio::time::sleep(IDLE_BACKOFF).await;
                }
            }
        }

        heartbeat_handle.abort();
        info!("job executor stopped");
        Ok(())
    }

    async fn claim_next_job(&self) -> Option<(Priority, QueuedJob)> {
        for priority in Priority::ALL {
            match self.coordinator.dequeue(priority).await {
                Ok(Some(job)) => return Some((priority, job)),
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, priority = %priority, "failed to poll queue");
                }
            }
        }
        None
    }

    async fn run_job(&self, priority: Priority, job: QueuedJob) {
        let fp = match fingerprint_from_job(&job) {
            Ok(fp) => fp,
            Err(e) => {
                error!(error = %e, video_id = %job.video_id, "dropping malformed queued job");
                return;
            }
        };

        info!(job_id = %fp.job_id(), priority = %priority, "starting job");

        let result = self
            .generator
            .generate(&fp, job.title.clone(), true, job.is_livestream)
            .await;

        if let Err(e) = self.coordinator.clear_job(&fp).await {
            warn!(error = %e, job_id = %fp.job_id(), "failed to clear job dedup marker");
        }

        match result {
            Ok(()) => {
                if let Err(e) = self.coordinator.set_best_time(&fp.video_id, fp.time).await {
                    warn!(error = %e, job_id = %fp.job_id(), "failed to update best-time hint");
                }
                info!(job_id = %fp.job_id(), "job finished successfully");
            }
            Err(e) => error!(job_id = %fp.job_id(), error = %e, "job failed"),
        }
    }
}

fn fingerprint_from_job(job: &QueuedJob) -> Result<Fingerprint, String> {
    let video_id = VideoId::parse(&job.video_id).map_err(|e| e.to_string())?;
    let time = TimeOffset::parse(job.time).map_err(|e| e.to_string())?;
    Ok(Fingerprint::new(video_id, time))
}
