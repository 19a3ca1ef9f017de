//! Failures while loading, checking or saving `serial_tool.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is not valid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Cannot encode settings as TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write config file {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting the tool cannot use. `key` is its TOML path, e.g.
    /// `serial.baud_rate` or `history.size`.
    #[error("Bad setting {key}: {message}")]
    Invalid { key: String, message: String },

    /// A `SERIAL_TOOL_*` override that does not parse.
    #[error("Bad environment override {var}: {message}")]
    EnvOverride { var: String, message: String },

    /// The loader was built from defaults and has nowhere to save.
    #[error("No config file to save to; use save_to with a path")]
    NoPath,
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_override(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvOverride {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_names_the_key() {
        let err = ConfigError::invalid("serial.baud_rate", "1234 is not a supported baud rate");
        assert_eq!(
            err.to_string(),
            "Bad setting serial.baud_rate: 1234 is not a supported baud rate"
        );
    }

    #[test]
    fn test_env_override_names_the_variable() {
        let err = ConfigError::env_override("SERIAL_TOOL_HISTORY_SIZE", "expected a number, got \"lots\"");
        assert_eq!(
            err.to_string(),
            "Bad environment override SERIAL_TOOL_HISTORY_SIZE: expected a number, got \"lots\""
        );
    }

    #[test]
    fn test_read_error_shows_path() {
        let err = ConfigError::Read {
            path: PathBuf::from("serial_tool.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(
            err.to_string(),
            "Cannot read config file \"serial_tool.toml\": missing"
        );
    }
}
