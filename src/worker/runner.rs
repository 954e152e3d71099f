//! Worker loop - processes queued job ids one at a time

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::WorkerConfig;
use super::fetcher::Fetcher;
use crate::janitor::Janitor;
use crate::job::JobId;
use crate::observability::Metrics;
use crate::queue::{Dequeued, JobReceiver};
use crate::status::ResultStore;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move {} to {}: {source}", from.display(), to.display())]
    Publish {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to record fetch failure at {}: {source}", path.display())]
    RecordFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// What happened to a single dequeued job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// A video artifact already existed; nothing was fetched
    Skipped,
    /// The fetch succeeded and the video was moved into place
    Downloaded,
    /// The fetch failed and its diagnostics were stored as the artifact
    Failed,
}

pub struct DownloadWorker<F> {
    jobs: JobReceiver,
    config: WorkerConfig,
    results: ResultStore,
    janitor: Janitor,
    fetcher: F,
    metrics: Arc<Metrics>,
}

impl<F: Fetcher> DownloadWorker<F> {
    pub fn new(
        jobs: JobReceiver,
        config: WorkerConfig,
        retention: Duration,
        fetcher: F,
        metrics: Arc<Metrics>,
    ) -> Self {
        let results = ResultStore::new(&config.results_dir);
        let janitor = Janitor::new(
            &config.work_dir,
            &config.results_dir,
            retention,
            jobs.busy_flag().clone(),
        );

        Self {
            jobs,
            config,
            results,
            janitor,
            fetcher,
            metrics,
        }
    }

    /// Run until every queue handle is dropped.
    ///
    /// Jobs and janitor ticks share this loop, so a sweep never overlaps a
    /// fetch started here. A job that fails is logged and the loop moves on.
    pub async fn run(mut self) {
        let period = self.config.sweep_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            work_dir = %self.config.work_dir.display(),
            results_dir = %self.config.results_dir.display(),
            sweep_interval_secs = period.as_secs(),
            retention_secs = self.janitor.retention().as_secs(),
            "Download worker started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = self.janitor.sweep().await;
                    self.metrics.artifacts_expired(stats.expired_removed);
                }
                job = self.jobs.recv() => match job {
                    Some(job) => self.handle(job).await,
                    None => {
                        info!("Job queue closed, download worker stopping");
                        break;
                    }
                },
            }
        }
    }

    /// The dequeued job, and with it the busy flag, lives until the outcome
    /// is recorded.
    async fn handle(&self, job: Dequeued) {
        let id = job.id();
        match self.execute(id).await {
            Ok(JobOutcome::Downloaded) => self.metrics.download_succeeded(),
            Ok(JobOutcome::Skipped) => self.metrics.download_skipped(),
            Ok(JobOutcome::Failed) => self.metrics.download_failed(),
            Err(e) => {
                error!(job_id = %id, error = %e, "Job aborted");
                self.metrics.download_failed();
            }
        }
    }

    /// Process one job: a single fetch attempt, no retries.
    ///
    /// The busy flag is raised for the whole call, including the idempotence
    /// check, and cleared on every exit path.
    pub async fn process(&self, id: &JobId) -> Result<JobOutcome> {
        let _busy = self.jobs.busy_flag().mark_busy();
        self.execute(id).await
    }

    async fn execute(&self, id: &JobId) -> Result<JobOutcome> {
        info!(job_id = %id, "Processing job");

        if self.results.is_success(id).await {
            info!(job_id = %id, "Video already downloaded, skipping fetch");
            return Ok(JobOutcome::Skipped);
        }

        create_dir(&self.config.work_dir).await?;
        create_dir(&self.config.results_dir).await?;

        let scratch = self.config.work_dir.join(&self.config.output_file);
        let artifact = self.results.artifact_path(id);

        // A leftover from an earlier attempt would be taken for this job's output
        if tokio::fs::remove_file(&scratch).await.is_ok() {
            debug!(path = %scratch.display(), "Removed stale scratch file");
        }

        self.jitter().await;

        let url = format!("{}{}", self.config.url_prefix, id);
        match self
            .fetcher
            .fetch(&url, &self.config.work_dir, &self.config.output_file)
            .await
        {
            Ok(()) => {
                tokio::fs::rename(&scratch, &artifact)
                    .await
                    .map_err(|source| WorkerError::Publish {
                        from: scratch.clone(),
                        to: artifact.clone(),
                        source,
                    })?;
                info!(job_id = %id, path = %artifact.display(), "Download complete");
                Ok(JobOutcome::Downloaded)
            }
            Err(e) => {
                warn!(job_id = %id, url = %url, error = %e, "Fetch failed, recording diagnostics");
                tokio::fs::write(&artifact, e.diagnostic())
                    .await
                    .map_err(|source| WorkerError::RecordFailure {
                        path: artifact.clone(),
                        source,
                    })?;
                Ok(JobOutcome::Failed)
            }
        }
    }

    async fn jitter(&self) {
        let max_ms = u64::try_from(self.config.jitter_max.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return;
        }
        let delay = Duration::from_millis(rand::rng().random_range(0..max_ms));
        debug!(delay_ms = delay.as_millis() as u64, "Pausing before fetch");
        tokio::time::sleep(delay).await;
    }
}

async fn create_dir(path: &std::path::Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| WorkerError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}
