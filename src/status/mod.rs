//! Filesystem-derived job status
//!
//! There is no job table: whether a job exists, finished or failed is read
//! straight from the results directory. An artifact at `results/<id>` is a
//! success when its first bytes sniff as a video container and a failure
//! otherwise (the worker stores the fetch tool's diagnostics there).
//!
//! None of these checks return errors. A missing, unreadable, empty or
//! half-written file simply is "not a success".

pub mod sniff;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::job::JobId;
use crate::queue::JobQueue;

pub use sniff::{SNIFF_LEN, VideoKind, is_video, sniff_video};

/// Status of a job as seen by a poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum JobStatus {
    /// Artifact present and recognized as video
    Ready,
    /// Artifact present but holds diagnostic output
    Failed,
    /// No artifact yet while work is queued or running
    Pending { ahead: usize },
    NotFound,
}

/// Read-only view of the results directory
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn artifact_path(&self, id: &JobId) -> PathBuf {
        self.dir.join(id.as_str())
    }

    /// True if any artifact, success or failure, is present.
    pub async fn exists(&self, id: &JobId) -> bool {
        tokio::fs::metadata(self.artifact_path(id)).await.is_ok()
    }

    pub async fn is_success(&self, id: &JobId) -> bool {
        self.sniff(id).await.is_some()
    }

    /// Sniff the artifact's leading bytes; `None` for anything but video.
    pub async fn sniff(&self, id: &JobId) -> Option<VideoKind> {
        let prefix = read_prefix(&self.artifact_path(id)).await?;
        sniff_video(&prefix)
    }

    /// Combine the artifact with queue state into a poller-facing status.
    pub async fn status(&self, id: &JobId, queue: &JobQueue) -> JobStatus {
        // Sample the queue before touching the disk so a job that finishes
        // in between is seen as pending rather than missing.
        let depth = queue.queue_depth();
        let busy = queue.is_worker_busy();

        if self.exists(id).await {
            return if self.is_success(id).await {
                JobStatus::Ready
            } else {
                JobStatus::Failed
            };
        }

        if !busy && depth == 0 {
            return JobStatus::NotFound;
        }

        JobStatus::Pending {
            ahead: depth + usize::from(busy),
        }
    }
}

async fn read_prefix(path: &Path) -> Option<Vec<u8>> {
    let file = File::open(path).await.ok()?;
    let mut buf = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64)
        .read_to_end(&mut buf)
        .await
        .ok()?;
    Some(buf)
}
