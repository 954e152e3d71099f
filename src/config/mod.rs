//! Configuration management for vidbox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command line overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use vidbox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `VIDBOX__<section>__<key>`
//!
//! Examples:
//! - `VIDBOX__SERVER__BIND_ADDR=0.0.0.0:9000`
//! - `VIDBOX__STORAGE__RESULTS_DIR=/srv/vidbox/ready`
//! - `VIDBOX__FETCH__PROGRAM=yt-dlp`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/vidbox.toml`.
//! This can be overridden using the `VIDBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use models::{
    AuthConfig, Config, ConfigOverrides, FetchConfig, QueueConfig, RetentionConfig, ServerConfig,
    StorageConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or
    /// validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(ConfigOverrides::default())
    }

    /// Load configuration and apply command line overrides before validating
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = sources::load()?;
        config.apply(overrides);
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Check a configuration assembled in code
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = format!(
            r#"
[storage]
results_dir = "{}"
work_dir = "{}"
        "#,
            temp_dir.path().join("ready").display(),
            temp_dir.path().join(".temp").display()
        );

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.queue.capacity, 10);
        assert!(config.storage.results_dir.ends_with("ready"));
    }

    #[test]
    fn test_validation_catches_same_directories() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[storage]
results_dir = "/srv/vidbox/data"
work_dir = "/srv/vidbox/data"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::SameDirectories { .. })
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"

[storage]
results_dir = "/srv/vidbox/ready"
work_dir = "/srv/vidbox/.temp"

[queue]
capacity = 25

[fetch]
program = "yt-dlp"
url_prefix = "https://www.youtube.com/watch?v="
output_file = "video.mp4"
jitter_max_ms = 1500

[retention]
sweep_interval_secs = 120
result_ttl_hours = 6

[auth]
users_file = "/etc/vidbox/users.csv"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();

        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.queue.capacity, 25);
        assert_eq!(config.fetch.output_file, "video.mp4");
        assert_eq!(config.retention.result_ttl().as_secs(), 6 * 3600);
        assert!(config.auth.users_file.is_some());

        let worker = config.worker_config();
        assert_eq!(worker.jitter_max.as_millis(), 1500);
    }

    #[test]
    fn test_config_serializes_to_toml() {
        let mut config = Config::default();
        config.auth.users_file = None;

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[queue]"));
        assert!(rendered.contains("capacity = 10"));
        assert!(!rendered.contains("users_file"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.queue.capacity, config.queue.capacity);
    }
}
