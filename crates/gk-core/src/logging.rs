//! Logging infrastructure for gekko-probe

use std::fs::File;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogLevel};

/// Map a configured level to a tracing level, `None` when logging is off
pub fn level_for(log_level: LogLevel) -> Option<Level> {
    match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    }
}

/// Initialize the logging system based on configuration
///
/// Logs go to stderr, and also to `debug.log_path` when `debug.log_to_file`
/// is set. A log file that cannot be created is reported once logging is up.
pub fn init(config: &Config) {
    let Some(level) = level_for(config.debug.log_level) else {
        return;
    };

    match open_log_file(config) {
        Ok(file) => install(level, file),
        Err(err) => {
            install(level, None);
            tracing::warn!("Could not create log file {}: {}", config.debug.log_path.display(), err);
        }
    }
}

/// Initialize logging with default settings (for tests and quick starts)
pub fn init_default() {
    install(Level::INFO, None);
}

/// The configured log file, `None` when file logging is off
fn open_log_file(config: &Config) -> std::io::Result<Option<File>> {
    if !config.debug.log_to_file {
        return Ok(None);
    }
    File::create(&config.debug.log_path).map(Some)
}

fn install(level: Level, file: Option<File>) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    let file_layer = file.map(|file| fmt::layer().with_writer(Mutex::new(file)).with_ansi(false));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(file_layer)
        .try_init();
}

// Convenience macros for component-specific logging

/// Log a CPU trace message
#[macro_export]
macro_rules! cpu_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "cpu", $($arg)*)
    };
}

/// Log a CPU debug message
#[macro_export]
macro_rules! cpu_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "cpu", $($arg)*)
    };
}

/// Log a memory port trace message
#[macro_export]
macro_rules! mem_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "memory", $($arg)*)
    };
}

/// Log an evaluation driver debug message
#[macro_export]
macro_rules! driver_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "driver", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_for(LogLevel::Off), None);
        assert_eq!(level_for(LogLevel::Warn), Some(Level::WARN));
        assert_eq!(level_for(LogLevel::Trace), Some(Level::TRACE));
    }

    #[test]
    fn test_log_file_selection() {
        let mut config = Config::default();
        config.debug.log_to_file = false;
        assert!(open_log_file(&config).unwrap().is_none());

        config.debug.log_to_file = true;
        config.debug.log_path = std::env::temp_dir().join("gekko-probe-missing-dir").join("nested").join("session.log");
        assert!(open_log_file(&config).is_err());

        config.debug.log_path = std::env::temp_dir().join(format!("gekko-probe-{}.log", std::process::id()));
        assert!(open_log_file(&config).unwrap().is_some());
        let _ = std::fs::remove_file(&config.debug.log_path);
    }
}
