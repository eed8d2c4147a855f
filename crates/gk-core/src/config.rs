//! Configuration for gekko-probe
//!
//! Settings live in `<config_dir>/gekko-probe/config.toml`. Missing files and
//! missing keys fall back to the defaults below.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directory name under the platform configuration directory
const CONFIG_DIR_NAME: &str = "gekko-probe";
/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub interpreter: InterpreterConfig,
    pub memory: MemoryConfig,
    pub debug: DebugConfig,
}

/// Interpreter behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Stop the evaluation loop on the first invalid/unimplemented instruction
    pub halt_on_invalid: bool,
    /// Reject data accesses that are not aligned to their operand width
    pub strict_alignment: bool,
    /// Base address added to exception vector offsets (0xC00 for `sc`, ...)
    pub exception_base: u32,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            halt_on_invalid: false,
            strict_alignment: true,
            exception_base: 0x8000_0000,
        }
    }
}

/// In-process memory image settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Size of main RAM in bytes
    pub main_ram_size: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            main_ram_size: 0x0180_0000,
        }
    }
}

/// Log verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Debugging and logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: LogLevel,
    pub log_to_file: bool,
    pub log_path: PathBuf,
    /// Emit a trace event for every executed instruction
    pub trace_instructions: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_to_file: false,
            log_path: PathBuf::from("gekko-probe.log"),
            trace_instructions: false,
        }
    }
}

impl Config {
    /// Path of the configuration file
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the configuration, returning defaults when no file exists yet
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the configuration to the platform config directory
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, self.to_toml_string()?)?;
        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize the configuration to TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.interpreter.halt_on_invalid);
        assert!(config.interpreter.strict_alignment);
        assert_eq!(config.interpreter.exception_base, 0x8000_0000);
        assert_eq!(config.memory.main_ram_size, 24 * 1024 * 1024);
        assert_eq!(config.debug.log_level, LogLevel::Info);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [interpreter]
            halt_on_invalid = true

            [debug]
            log_level = "trace"
            "#,
        )
        .unwrap();

        assert!(config.interpreter.halt_on_invalid);
        assert!(config.interpreter.strict_alignment);
        assert_eq!(config.debug.log_level, LogLevel::Trace);
        assert_eq!(config.memory, MemoryConfig::default());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.interpreter.exception_base = 0;
        config.debug.trace_instructions = true;

        let text = config.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let err = Config::from_toml_str("interpreter = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
