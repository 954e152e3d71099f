use super::models::Config;
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Directory setting '{field}' must not be empty")]
    EmptyDirectory { field: &'static str },

    #[error("Directory setting '{field}' must not be the system temporary directory")]
    SystemTempDirectory { field: &'static str },

    #[error("results_dir and work_dir must be different directories ({path})")]
    SameDirectories { path: String },

    #[error("Bind address must be host:port or :port, got '{value}'")]
    InvalidBindAddress { value: String },

    #[error("Queue capacity must be at least 1")]
    InvalidQueueCapacity,

    #[error("Fetch program must not be empty")]
    EmptyFetchProgram,

    #[error("Output file must be a bare file name, got '{value}'")]
    InvalidOutputFile { value: String },

    #[error("Retention setting must be positive: {field} = {value}")]
    InvalidRetention { field: &'static str, value: u64 },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_storage(config)?;
    validate_queue(config)?;
    validate_fetch(config)?;
    validate_retention(config)?;
    Ok(())
}

/// The address is resolved only when binding, so just its shape is checked.
fn validate_server(config: &Config) -> Result<(), ValidationError> {
    let addr = config.server.listen_addr();
    let valid = match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidBindAddress {
            value: config.server.bind_addr.clone(),
        });
    }
    Ok(())
}

/// Results and scratch directories must be distinct, real locations.
/// The janitor wipes the scratch directory wholesale, so it must never
/// point at a shared temporary location.
fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    let results = &config.storage.results_dir;
    let work = &config.storage.work_dir;

    for (field, path) in [("results_dir", results), ("work_dir", work)] {
        if path.as_os_str().is_empty() {
            return Err(ValidationError::EmptyDirectory { field });
        }
        if same_path(path, &std::env::temp_dir()) {
            return Err(ValidationError::SystemTempDirectory { field });
        }
    }

    if same_path(results, work) {
        return Err(ValidationError::SameDirectories {
            path: results.display().to_string(),
        });
    }

    Ok(())
}

fn validate_queue(config: &Config) -> Result<(), ValidationError> {
    if config.queue.capacity == 0 {
        return Err(ValidationError::InvalidQueueCapacity);
    }
    Ok(())
}

fn validate_fetch(config: &Config) -> Result<(), ValidationError> {
    if config.fetch.program.trim().is_empty() {
        return Err(ValidationError::EmptyFetchProgram);
    }

    let output = Path::new(&config.fetch.output_file);
    let mut components = output.components();
    let bare = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !bare {
        return Err(ValidationError::InvalidOutputFile {
            value: config.fetch.output_file.clone(),
        });
    }

    Ok(())
}

fn validate_retention(config: &Config) -> Result<(), ValidationError> {
    if config.retention.sweep_interval_secs == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "sweep_interval_secs",
            value: 0,
        });
    }
    if config.retention.result_ttl_hours == 0 {
        return Err(ValidationError::InvalidRetention {
            field: "result_ttl_hours",
            value: 0,
        });
    }
    Ok(())
}

/// Compare ignoring trailing separators and `.` components
fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.storage.results_dir = PathBuf::from("/srv/vidbox/ready");
        config.storage.work_dir = PathBuf::from("/srv/vidbox/.temp");
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_directory() {
        let mut config = valid_config();
        config.storage.work_dir = PathBuf::new();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::EmptyDirectory { field: "work_dir" })
        ));
    }

    #[test]
    fn test_same_directories() {
        let mut config = valid_config();
        config.storage.work_dir = PathBuf::from("/srv/vidbox/ready/");

        let result = validate(&config);
        assert!(matches!(result, Err(ValidationError::SameDirectories { .. })));
    }

    #[test]
    fn test_system_temp_rejected() {
        let mut config = valid_config();
        config.storage.work_dir = std::env::temp_dir();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::SystemTempDirectory { field: "work_dir" })
        ));
    }

    #[test]
    fn test_bind_address_forms() {
        for value in ["localhost:8080", ":8080", "0.0.0.0:9000", "[::1]:8080"] {
            let mut config = valid_config();
            config.server.bind_addr = value.to_string();
            assert!(validate(&config).is_ok(), "{value:?} should be accepted");
        }

        for value in ["", "localhost", "localhost:", ":http", "host:99999"] {
            let mut config = valid_config();
            config.server.bind_addr = value.to_string();
            assert!(
                matches!(
                    validate(&config),
                    Err(ValidationError::InvalidBindAddress { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_capacity() {
        let mut config = valid_config();
        config.queue.capacity = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidQueueCapacity)
        ));
    }

    #[test]
    fn test_output_file_must_be_bare_name() {
        for value in ["", "../out.mp4", "sub/out.mp4", "/tmp/out.mp4", ".."] {
            let mut config = valid_config();
            config.fetch.output_file = value.to_string();

            assert!(
                matches!(
                    validate(&config),
                    Err(ValidationError::InvalidOutputFile { .. })
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_empty_program() {
        let mut config = valid_config();
        config.fetch.program = "  ".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::EmptyFetchProgram)
        ));
    }

    #[test]
    fn test_zero_retention() {
        let mut config = valid_config();
        config.retention.result_ttl_hours = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRetention {
                field: "result_ttl_hours",
                ..
            })
        ));

        let mut config = valid_config();
        config.retention.sweep_interval_secs = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRetention {
                field: "sweep_interval_secs",
                ..
            })
        ));
    }
}
