//! Disk reclamation for the working and results directories
//!
//! Two independent, best-effort sweeps:
//! - working directory: every regular file is removed
//! - results directory: regular files older than the retention window are removed
//!
//! Both walk subdirectories but never delete directories. Per-file errors
//! are logged at debug level and skipped; a sweep never fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::queue::BusyFlag;

/// Default pause between sweeps
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default maximum artifact age
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Sweep statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub scratch_removed: usize,
    pub expired_removed: usize,
    /// True when the working directory was left alone because a job was running
    pub scratch_skipped: bool,
}

#[derive(Debug, Clone)]
pub struct Janitor {
    work_dir: PathBuf,
    results_dir: PathBuf,
    retention: Duration,
    busy: BusyFlag,
}

impl Janitor {
    pub fn new(
        work_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
        retention: Duration,
        busy: BusyFlag,
    ) -> Self {
        Self {
            work_dir: work_dir.into(),
            results_dir: results_dir.into(),
            retention,
            busy,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Run both sweeps off the async runtime.
    pub async fn sweep(&self) -> SweepStats {
        let janitor = self.clone();
        match tokio::task::spawn_blocking(move || janitor.sweep_blocking(SystemTime::now())).await
        {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "Sweep task failed");
                SweepStats::default()
            }
        }
    }

    /// Run both sweeps with `now` as the reference time for expiry.
    pub fn sweep_blocking(&self, now: SystemTime) -> SweepStats {
        let mut stats = SweepStats::default();

        // Scratch files of an in-flight fetch must survive the sweep
        if self.busy.is_busy() {
            stats.scratch_skipped = true;
            debug!(path = %self.work_dir.display(), "Worker busy, skipping scratch sweep");
        } else {
            stats.scratch_removed = clear_scratch(&self.work_dir);
        }

        stats.expired_removed = expire_results(&self.results_dir, self.retention, now);

        info!(
            scratch_removed = stats.scratch_removed,
            expired_removed = stats.expired_removed,
            scratch_skipped = stats.scratch_skipped,
            "Sweep complete"
        );
        stats
    }
}

/// Remove every regular file below `dir`.
pub fn clear_scratch(dir: &Path) -> usize {
    let mut removed = 0;
    for path in regular_files(dir) {
        if remove(&path) {
            removed += 1;
        }
    }
    removed
}

/// Remove regular files below `dir` last modified strictly more than
/// `retention` before `now`. Files with a modification time in the future
/// are kept.
pub fn expire_results(dir: &Path, retention: Duration, now: SystemTime) -> usize {
    let mut removed = 0;
    for path in regular_files(dir) {
        let modified = match fs::metadata(&path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Cannot read mtime, skipping");
                continue;
            }
        };

        let expired = now
            .duration_since(modified)
            .map(|age| age > retention)
            .unwrap_or(false);

        if expired && remove(&path) {
            removed += 1;
        }
    }
    removed
}

fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed file");
            true
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}

/// Collect regular files below `root`, depth first. Symlinks are neither
/// followed nor returned. Unreadable directories are skipped.
fn regular_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Cannot read directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                files.push(entry.path());
            }
        }
    }

    files
}
