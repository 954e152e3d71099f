use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::worker::WorkerConfig;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// `host:port` to listen on. The host may be a name such as
    /// `localhost`; `:port` listens on every interface.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl ServerConfig {
    /// Address handed to the listener, with an empty host filled in
    pub fn listen_addr(&self) -> String {
        let addr = self.bind_addr.trim();
        match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => addr.to_string(),
        }
    }
}

fn default_bind_addr() -> String {
    "localhost:8080".to_string()
}

/// Download directories. Both must live on the same filesystem so a
/// finished download can be renamed into place.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            work_dir: default_work_dir(),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_results_dir() -> PathBuf {
    home_dir().join("youtube").join("ready")
}

fn default_work_dir() -> PathBuf {
    home_dir().join("youtube").join(".temp")
}

/// Job queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_queue_capacity(),
        }
    }
}

fn default_queue_capacity() -> usize {
    10
}

/// External fetch tool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    /// youtube-dl compatible program, looked up on `PATH`
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,
    #[serde(default = "default_output_file")]
    pub output_file: String,
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            url_prefix: default_url_prefix(),
            output_file: default_output_file(),
            jitter_max_ms: default_jitter_max_ms(),
        }
    }
}

fn default_program() -> String {
    "youtube-dl".to_string()
}

fn default_url_prefix() -> String {
    crate::worker::DEFAULT_URL_PREFIX.to_string()
}

fn default_output_file() -> String {
    crate::worker::DEFAULT_OUTPUT_FILE.to_string()
}

fn default_jitter_max_ms() -> u64 {
    crate::worker::DEFAULT_JITTER_MAX.as_millis() as u64
}

/// Retention configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_result_ttl_hours")]
    pub result_ttl_hours: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            result_ttl_hours: default_result_ttl_hours(),
        }
    }
}

impl RetentionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_hours.saturating_mul(60 * 60))
    }
}

fn default_sweep_interval_secs() -> u64 {
    crate::janitor::DEFAULT_SWEEP_INTERVAL.as_secs()
}

fn default_result_ttl_hours() -> u64 {
    crate::janitor::DEFAULT_RETENTION.as_secs() / (60 * 60)
}

/// Optional HTTP Basic authentication
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// File with `user,password` lines; unset disables authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_file: Option<PathBuf>,
}

/// Values given on the command line, applied on top of file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_addr: Option<String>,
    pub results_dir: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub users_file: Option<PathBuf>,
}

impl Config {
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_addr) = overrides.bind_addr {
            self.server.bind_addr = bind_addr;
        }
        if let Some(results_dir) = overrides.results_dir {
            self.storage.results_dir = results_dir;
        }
        if let Some(work_dir) = overrides.work_dir {
            self.storage.work_dir = work_dir;
        }
        if let Some(users_file) = overrides.users_file {
            self.auth.users_file = Some(users_file);
        }
    }

    /// Settings for the download worker derived from this configuration
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            work_dir: self.storage.work_dir.clone(),
            results_dir: self.storage.results_dir.clone(),
            url_prefix: self.fetch.url_prefix.clone(),
            output_file: self.fetch.output_file.clone(),
            jitter_max: Duration::from_millis(self.fetch.jitter_max_ms),
            sweep_interval: self.retention.sweep_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.bind_addr, "localhost:8080");
        assert_eq!(config.queue.capacity, 10);
        assert_eq!(config.fetch.program, "youtube-dl");
        assert_eq!(config.fetch.output_file, "out.mp4");
        assert_eq!(config.retention.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.retention.result_ttl(), Duration::from_secs(24 * 3600));
        assert!(config.storage.results_dir.ends_with("youtube/ready"));
        assert!(config.storage.work_dir.ends_with("youtube/.temp"));
        assert!(config.auth.users_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply(ConfigOverrides {
            bind_addr: Some(":9000".to_string()),
            results_dir: Some(PathBuf::from("/srv/ready")),
            work_dir: None,
            users_file: Some(PathBuf::from("/etc/vidbox/users.csv")),
        });

        assert_eq!(config.server.bind_addr, ":9000");
        assert_eq!(config.server.listen_addr(), "0.0.0.0:9000");
        assert_eq!(config.storage.results_dir, PathBuf::from("/srv/ready"));
        assert!(config.storage.work_dir.ends_with("youtube/.temp"));
        assert_eq!(
            config.auth.users_file,
            Some(PathBuf::from("/etc/vidbox/users.csv"))
        );
    }

    #[test]
    fn test_listen_addr() {
        let server = |bind_addr: &str| ServerConfig {
            bind_addr: bind_addr.to_string(),
        };

        assert_eq!(server("localhost:8080").listen_addr(), "localhost:8080");
        assert_eq!(server(":8080").listen_addr(), "0.0.0.0:8080");
        assert_eq!(server(" 127.0.0.1:9000 ").listen_addr(), "127.0.0.1:9000");
        assert_eq!(server("[::1]:8080").listen_addr(), "[::1]:8080");
    }

    #[test]
    fn test_worker_config() {
        let mut config = Config::default();
        config.fetch.jitter_max_ms = 0;
        config.retention.sweep_interval_secs = 60;

        let worker = config.worker_config();
        assert_eq!(worker.jitter_max, Duration::ZERO);
        assert_eq!(worker.sweep_interval, Duration::from_secs(60));
        assert_eq!(worker.output_file, "out.mp4");
        assert_eq!(worker.results_dir, config.storage.results_dir);
    }
}
