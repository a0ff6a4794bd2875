//! CLI error type.

use std::fmt;
use std::path::PathBuf;

use sunposition::error::{ConfigError, LoggingError};

/// Errors surfaced to the user by the `sunposition` binary.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file could not be loaded.
    Config(String),
    /// Logging could not be initialised.
    Logging(String),
    /// A file could not be read.
    Io { path: PathBuf, reason: String },
    /// A sensor log line could not be parsed.
    SensorLog { line: usize, reason: String },
    /// Invalid command-line argument combination.
    Argument(String),
    /// The async runtime could not be started.
    Runtime(String),
    /// Replay did not finish in time.
    Timeout(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
            CliError::Io { path, reason } => {
                write!(f, "Failed to read {}: {}", path.display(), reason)
            }
            CliError::SensorLog { line, reason } => {
                write!(f, "Sensor log line {}: {}", line, reason)
            }
            CliError::Argument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            CliError::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e.to_string())
    }
}
