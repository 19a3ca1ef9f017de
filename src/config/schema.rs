//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All configuration sections are defined here with appropriate defaults.

use super::error::{ConfigError, ConfigResult};
use crate::codec::validate_timestamp_format;
use crate::history::DEFAULT_HISTORY_SIZE;
use crate::port::{self, is_supported_baud, DataBits, Parity, StopBits, BAUD_RATES};
use crate::reader::{DEFAULT_POLL_INTERVAL, DEFAULT_QUEUE_CAPACITY};
use crate::session::{SessionOptions, DEFAULT_READ_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Timestamp patterns offered by the front-end.
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "[%H:%M:%S]",
    "[%Y-%m-%d %H:%M:%S]",
];

/// Pattern used when none is configured.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "[%H:%M:%S]";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialSettings,
    /// Receive and history rendering
    pub display: DisplayConfig,
    /// Send history
    pub history: HistoryConfig,
    /// TUI configuration
    pub tui: TuiConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Check every value a session or the front-end relies on.
    pub fn validate(&self) -> ConfigResult<()> {
        if !is_supported_baud(self.serial.baud_rate) {
            return Err(ConfigError::invalid(
                "serial.baud_rate",
                format!(
                    "{} is not one of {:?}",
                    self.serial.baud_rate, BAUD_RATES
                ),
            ));
        }
        if self.serial.queue_capacity == 0 {
            return Err(ConfigError::invalid(
                "serial.queue_capacity",
                "must be greater than zero",
            ));
        }
        if self.serial.poll_interval_ms == 0 {
            return Err(ConfigError::invalid(
                "serial.poll_interval_ms",
                "must be greater than zero",
            ));
        }
        if self.history.size == 0 {
            return Err(ConfigError::invalid(
                "history.size",
                "must be greater than zero",
            ));
        }
        if self.tui.tick_rate_ms == 0 {
            return Err(ConfigError::invalid(
                "tui.tick_rate_ms",
                "must be greater than zero",
            ));
        }
        validate_timestamp_format(&self.display.timestamp_format)
            .map_err(|e| ConfigError::invalid("display.timestamp_format", e.to_string()))?;
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Device to open at startup
    pub port: Option<String>,
    /// Baud rate, one of the supported rates
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// OS read timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Reader sleep when no bytes are pending, in milliseconds
    pub poll_interval_ms: u64,
    /// Reader events buffered before the oldest is dropped
    pub queue_capacity: usize,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: port::DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            read_timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl SerialSettings {
    /// Framing to open ports with.
    pub fn framing(&self) -> ConfigResult<port::SerialConfig> {
        let config = port::SerialConfig::new(self.baud_rate)
            .map_err(|e| ConfigError::invalid("serial.baud_rate", e.to_string()))?;
        Ok(config
            .with_data_bits(self.data_bits)
            .with_parity(self.parity)
            .with_stop_bits(self.stop_bits))
    }

    /// Session tunables.
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            queue_capacity: self.queue_capacity,
        }
    }
}

/// Rendering options for the receive pane and the history list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show received bytes as hex
    pub hex_display: bool,
    /// Parse the send box as hex digits
    pub hex_send: bool,
    /// Prefix received chunks and history entries with a timestamp
    pub timestamps: bool,
    /// strftime pattern for the prefix
    pub timestamp_format: String,
    /// Follow the end of the receive pane
    pub auto_scroll: bool,
    /// Add `\n` to text sends that lack one
    pub append_newline: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            hex_display: false,
            hex_send: false,
            timestamps: false,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            auto_scroll: true,
            append_newline: false,
        }
    }
}

/// Send history section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum entries kept
    pub size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_HISTORY_SIZE,
        }
    }
}

/// TUI configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuiConfig {
    /// Theme name: "dark" or "light"
    pub theme: String,
    /// Event poll tick in milliseconds
    pub tick_rate_ms: u64,
    /// Lines of received text kept in the receive buffer
    pub scrollback_lines: usize,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            tick_rate_ms: 50,
            scrollback_lines: 10_000,
        }
    }
}

impl TuiConfig {
    /// Get the tick as Duration
    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path; no file means no logging
    pub file: Option<PathBuf>,
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Log format: "pretty" or "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human format
    Pretty,
    /// One line per event
    #[default]
    Compact,
}
