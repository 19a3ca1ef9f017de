//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_TOOL";

/// Config file name
const CONFIG_FILE_NAME: &str = "serial_tool.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_TOOL_CONFIG";

/// Application name used for the platform config directory
const APP_NAME: &str = "serial-tool";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_TOOL_CONFIG` environment variable (explicit path)
    /// 2. `./serial_tool.toml` (current directory)
    /// 3. The platform config directory
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values. The result is validated.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;
        debug!(path = ?config_path, "configuration loaded");

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults; a bad value keeps the default
        let mut overridden = config.clone();
        if apply_env_overrides(&mut overridden).is_ok() && overridden.validate().is_ok() {
            config = overridden;
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a mutable reference to the configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoPath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }

    /// Reload configuration from file (if path is set).
    pub fn reload(&mut self) -> ConfigResult<()> {
        if let Some(ref path) = self.config_path {
            let mut config = load_from_file(path)?;
            apply_env_overrides(&mut config)?;
            config.validate()?;
            self.config = config;
        }
        Ok(())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    // 1. Explicit environment variable
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. Current directory
    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    // 3. Platform config directory
    if let Some(app_config) = get_default_config_path() {
        if app_config.exists() {
            return Some(app_config);
        }
    }

    // 4. No config file found - will use defaults
    None
}

/// Get the default config directory for creating new config files.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::Toml)
}

/// Save configuration to a file.
fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read `SERIAL_TOOL_<suffix>` and parse it, if set.
fn env_value<T: FromStr>(suffix: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{}_{}", ENV_PREFIX, suffix);
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_override(var, format!("expected {what}, got {val:?}"))),
        Err(_) => Ok(None),
    }
}

fn env_flag(suffix: &str) -> Option<bool> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix))
        .ok()
        .map(|val| val.eq_ignore_ascii_case("true") || val == "1")
}

fn env_string(suffix: &str) -> Option<String> {
    std::env::var(format!("{}_{}", ENV_PREFIX, suffix)).ok()
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern: `SERIAL_TOOL_<SECTION>_<KEY>`
/// For example:
/// - `SERIAL_TOOL_SERIAL_PORT=COM3`
/// - `SERIAL_TOOL_SERIAL_BAUD_RATE=9600`
/// - `SERIAL_TOOL_HISTORY_SIZE=50`
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some(val) = env_string("SERIAL_PORT") {
        config.serial.port = Some(val);
    }
    if let Some(val) = env_value("SERIAL_BAUD_RATE", "baud rate")? {
        config.serial.baud_rate = val;
    }
    if let Some(val) = env_value("SERIAL_DATA_BITS", "data bits")? {
        config.serial.data_bits = val;
    }
    if let Some(val) = env_value("SERIAL_PARITY", "parity")? {
        config.serial.parity = val;
    }
    if let Some(val) = env_value("SERIAL_STOP_BITS", "stop bits")? {
        config.serial.stop_bits = val;
    }
    if let Some(val) = env_value("SERIAL_READ_TIMEOUT_MS", "timeout")? {
        config.serial.read_timeout_ms = val;
    }

    // Display overrides
    if let Some(val) = env_flag("DISPLAY_HEX") {
        config.display.hex_display = val;
    }
    if let Some(val) = env_flag("DISPLAY_HEX_SEND") {
        config.display.hex_send = val;
    }
    if let Some(val) = env_flag("DISPLAY_TIMESTAMPS") {
        config.display.timestamps = val;
    }
    if let Some(val) = env_string("DISPLAY_TIMESTAMP_FORMAT") {
        config.display.timestamp_format = val;
    }
    if let Some(val) = env_flag("DISPLAY_APPEND_NEWLINE") {
        config.display.append_newline = val;
    }

    // History overrides
    if let Some(val) = env_value("HISTORY_SIZE", "history size")? {
        config.history.size = val;
    }

    // TUI overrides
    if let Some(val) = env_string("TUI_THEME") {
        config.tui.theme = val;
    }

    // Logging overrides
    if let Some(val) = env_string("LOGGING_FILE") {
        config.logging.file = Some(PathBuf::from(val));
    }
    if let Some(val) = env_string("LOGGING_LEVEL") {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::Parity;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud_rate, 115200);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_TOOL_SERIAL_BAUD_RATE", "9600");
        env::set_var("SERIAL_TOOL_SERIAL_PARITY", "odd");
        env::set_var("SERIAL_TOOL_DISPLAY_HEX", "1");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.baud_rate, 9600);
        assert_eq!(loader.config().serial.parity, Parity::Odd);
        assert!(loader.config().display.hex_display);

        // Clean up
        env::remove_var("SERIAL_TOOL_SERIAL_BAUD_RATE");
        env::remove_var("SERIAL_TOOL_SERIAL_PARITY");
        env::remove_var("SERIAL_TOOL_DISPLAY_HEX");
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        env::set_var("SERIAL_TOOL_HISTORY_SIZE", "lots");

        let mut config = Config::default();
        let err = apply_env_overrides(&mut config).unwrap_err();
        assert!(matches!(err, ConfigError::EnvOverride { ref var, .. } if var == "SERIAL_TOOL_HISTORY_SIZE"));

        // defaults survive a bad override
        assert_eq!(ConfigLoader::with_defaults().config().history.size, 100);

        env::remove_var("SERIAL_TOOL_HISTORY_SIZE");
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let mut loader = ConfigLoader::with_defaults();
        loader.config_mut().serial.baud_rate = 57600;
        loader.config_mut().history.size = 20;
        loader.save_to(&path).unwrap();

        let mut reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().serial.baud_rate, 57600);
        assert_eq!(reloaded.config().history.size, 20);

        std::fs::write(&path, "[history]\nsize = 7\n").unwrap();
        reloaded.reload().unwrap();
        assert_eq!(reloaded.config().history.size, 7);
        assert_eq!(reloaded.config().serial.baud_rate, 115200);
    }

    #[test]
    #[serial]
    fn test_load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[serial]\nbaud_rate = 1234\n").unwrap();

        assert!(matches!(
            ConfigLoader::load_from(&path),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ConfigLoader::load_from(dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_save_without_path() {
        let loader = ConfigLoader::with_defaults();
        assert!(matches!(loader.save(), Err(ConfigError::NoPath)));
    }

    #[test]
    #[serial]
    fn test_explicit_config_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[display]\ntimestamps = true\n").unwrap();
        env::set_var(CONFIG_PATH_ENV, &path);

        assert_eq!(resolve_config_path(), Some(path.clone()));
        let loader = ConfigLoader::load().unwrap();
        assert!(loader.config().display.timestamps);

        env::remove_var(CONFIG_PATH_ENV);
    }
}
