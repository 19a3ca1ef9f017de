//! Error types for the serial tool.
//!
//! Each core operation has its own small error enum so callers can match on
//! exactly what can go wrong. `AppError` gathers them for the console and
//! the terminal front-end, which only need to show a message.

use crate::config::ConfigError;
use crate::port::PortError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to open a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenError {
    /// No device identifier was given.
    #[error("No serial port selected")]
    NoDeviceSelected,

    /// The session already holds an open port; close it first.
    #[error("Port is already open. Close it before opening another one")]
    AlreadyOpen,

    /// The framing cannot be expressed by the serial backend.
    #[error("Unsupported port settings: {0}")]
    UnsupportedFraming(String),

    /// The OS refused the device (busy, missing, permissions...).
    #[error("Cannot open serial port: {0}")]
    DeviceUnavailable(String),
}

impl From<PortError> for OpenError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unsupported(msg) => Self::UnsupportedFraming(msg),
            other => Self::DeviceUnavailable(other.to_string()),
        }
    }
}

/// Failure to write to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WriteError {
    /// No port is open.
    #[error("Operation requires an open serial port, but the port is closed")]
    NotOpen,

    /// The OS write failed.
    #[error("Write failed: {0}")]
    IoFailure(String),
}

/// Failure to parse user-entered text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A character that is neither a hex digit nor whitespace.
    #[error("Invalid hex character {0:?}")]
    InvalidCharacter(char),

    /// A strftime pattern chrono cannot render.
    #[error("Invalid timestamp format {0:?}")]
    InvalidTimestampFormat(String),

    /// Text that is not valid JSON.
    #[error("Not valid JSON: {0}")]
    InvalidJson(String),
}

/// Failure to address a history entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("History index {index} out of range (history has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Everything the console can report to the user.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Send was requested with nothing to send.
    #[error("Nothing to send")]
    EmptyPayload,

    /// Writing the receive buffer to disk failed.
    #[error("Failed to save '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for console operations.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_error_from_port_error() {
        let err: OpenError = PortError::unsupported("Mark parity").into();
        assert_eq!(err, OpenError::UnsupportedFraming("Mark parity".into()));

        let err: OpenError = PortError::not_found("/dev/ttyUSB9").into();
        match err {
            OpenError::DeviceUnavailable(msg) => assert!(msg.contains("/dev/ttyUSB9")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            ParseError::InvalidCharacter('G').to_string(),
            "Invalid hex character 'G'"
        );
        assert_eq!(
            HistoryError::IndexOutOfRange { index: 3, len: 2 }.to_string(),
            "History index 3 out of range (history has 2 entries)"
        );
        let err: AppError = WriteError::IoFailure("device gone".into()).into();
        assert_eq!(err.to_string(), "Write failed: device gone");
    }

    #[test]
    fn test_save_error_names_path() {
        let err = AppError::Save {
            path: PathBuf::from("/tmp/out.txt"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out.txt"));
        assert!(msg.contains("denied"));
    }
}
