//! Tracing subscriber setup.
//!
//! The TUI owns the terminal, so while it runs events only ever go to a
//! file. With no file configured nothing is installed and every `tracing`
//! macro is a no-op. Paths that leave the terminal alone, such as `--list`,
//! log to stderr through [`init_stderr`].

use crate::config::{LogFormat, LoggingConfig};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log filter {0:?}")]
    Filter(String),

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|_| LoggingError::Filter(config.level.clone())),
    }
}

/// Install the global subscriber. Returns `false` when no log file is
/// configured and nothing was installed.
pub fn init(config: &LoggingConfig) -> Result<bool, LoggingError> {
    let Some(path) = &config.file else {
        return Ok(false);
    };

    let filter = build_filter(config)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true);

    let installed = match config.format {
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::info!(path = %path.display(), "logging initialised");
    Ok(true)
}

/// Install a compact stderr subscriber for runs that never start the TUI.
pub fn init_stderr(config: &LoggingConfig) -> Result<(), LoggingError> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_file_installs_nothing() {
        assert!(!init(&LoggingConfig::default()).unwrap());
    }

    #[test]
    fn test_bad_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            file: Some(dir.path().join("missing").join("tool.log")),
            ..LoggingConfig::default()
        };
        assert!(matches!(init(&config), Err(LoggingError::File { .. })));
    }

    #[test]
    fn test_stderr_installs_once() {
        let config = LoggingConfig::default();
        assert!(init_stderr(&config).is_ok());
        assert!(matches!(
            init_stderr(&config),
            Err(LoggingError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_filter_from_level() {
        let config = LoggingConfig {
            level: "serial_tool=debug".to_string(),
            ..LoggingConfig::default()
        };
        assert!(build_filter(&config).is_ok());
    }
}
