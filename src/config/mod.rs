//! Configuration module for serial_tool.
//!
//! This module provides TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_TOOL_CONFIG` environment variable (explicit path)
//! 2. `./serial_tool.toml` (current directory)
//! 3. The platform config directory, e.g. `~/.config/serial-tool/serial_tool.toml`
//!    on Linux or `%APPDATA%\serial-tool\config\serial_tool.toml` on Windows
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Common values can be overridden via environment variables.
//! The pattern is: `SERIAL_TOOL_<SECTION>_<KEY>`
//!
//! Examples:
//! - `SERIAL_TOOL_SERIAL_PORT=/dev/ttyUSB0`
//! - `SERIAL_TOOL_SERIAL_BAUD_RATE=9600`
//! - `SERIAL_TOOL_DISPLAY_HEX=true`
//! - `SERIAL_TOOL_HISTORY_SIZE=50`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_tool::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Default baud: {}", config.serial.baud_rate);
//! # Ok::<(), serial_tool::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{
    Config, DisplayConfig, HistoryConfig, LogFormat, LoggingConfig, SerialSettings, TuiConfig,
    DEFAULT_TIMESTAMP_FORMAT, TIMESTAMP_FORMATS,
};
