//! External fetch tool invocation

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch tool exited with {status}")]
    Failed { status: String, stderr: Vec<u8> },

    #[error("failed to run fetch tool '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Bytes recorded as the job's artifact when the fetch fails.
    ///
    /// The tool's standard error when it ran, otherwise the spawn error text.
    pub fn diagnostic(&self) -> Vec<u8> {
        match self {
            FetchError::Failed { stderr, .. } => stderr.clone(),
            FetchError::Spawn { .. } => self.to_string().into_bytes(),
        }
    }
}

/// Downloads one video into a working directory.
///
/// Implementations write the result to `work_dir/output_file` and report
/// failure with the tool's diagnostics attached.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, work_dir: &Path, output_file: &str)
    -> Result<(), FetchError>;
}

/// Runs a youtube-dl compatible program as a subprocess
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
}

impl CommandFetcher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self, url: &str, work_dir: &Path, output_file: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["--no-mtime", "-q", "-o", output_file, url])
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for CommandFetcher {
    fn default() -> Self {
        Self::new("youtube-dl")
    }
}

#[async_trait]
impl Fetcher for CommandFetcher {
    async fn fetch(
        &self,
        url: &str,
        work_dir: &Path,
        output_file: &str,
    ) -> Result<(), FetchError> {
        debug!(program = %self.program, url, "Running fetch tool");

        let output = self
            .command(url, work_dir, output_file)
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }

        Err(FetchError::Failed {
            status: output.status.to_string(),
            stderr: output.stderr,
        })
    }
}
