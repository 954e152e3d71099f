//! Download worker service
//!
//! One long-lived task that takes job ids from the queue strictly one at a
//! time, runs the external fetch tool and leaves either the video or the
//! tool's diagnostics under `results/<id>`. The same loop drives the
//! [`Janitor`](crate::janitor::Janitor) on a timer.

pub mod fetcher;
pub mod runner;

use std::path::PathBuf;
use std::time::Duration;

pub use fetcher::{CommandFetcher, FetchError, Fetcher};
pub use runner::{DownloadWorker, JobOutcome, WorkerError};

pub const DEFAULT_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
pub const DEFAULT_OUTPUT_FILE: &str = "out.mp4";
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(4000);

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Scratch directory the fetch tool writes into
    pub work_dir: PathBuf,
    /// Final artifacts; must be on the same filesystem as `work_dir`
    pub results_dir: PathBuf,
    /// Canonical video URL is `url_prefix` followed by the job id
    pub url_prefix: String,
    /// Fixed temporary file name inside `work_dir`
    pub output_file: String,
    /// Upper bound of the random pause before each fetch; zero disables it
    pub jitter_max: Duration,
    pub sweep_interval: Duration,
}

impl WorkerConfig {
    pub fn new(work_dir: impl Into<PathBuf>, results_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            results_dir: results_dir.into(),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            jitter_max: DEFAULT_JITTER_MAX,
            sweep_interval: crate::janitor::DEFAULT_SWEEP_INTERVAL,
        }
    }
}
