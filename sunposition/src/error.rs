//! Error types for the sun position pipeline.
//!
//! None of these are fatal. Query errors end up as a failed
//! [`QueryState`](crate::query::QueryState) and leave the last known sun
//! position in place; store errors only cost a redundant query later.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Reasons an astronomical query can fail.
///
/// `Clone` so a failure can be carried inside the published query state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The location provider reported an error.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// The location provider did not answer in time.
    #[error("Location request timed out after {timeout:?}")]
    LocationTimeout { timeout: Duration },

    /// The coordinate is outside the valid latitude/longitude range.
    #[error("Invalid coordinate: lat={latitude}, lon={longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    /// The ephemeris calculation rejected its input.
    #[error("Ephemeris computation failed: {0}")]
    Ephemeris(String),

    /// The background task running the query died.
    #[error("Query task failed: {0}")]
    TaskFailed(String),
}

/// Errors from persisting the freshness record.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error reading or writing the state file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed as INI.
    #[error("Failed to read config {}: {}", .path.display(), .reason)]
    Read { path: PathBuf, reason: String },

    /// A key holds a value that cannot be used.
    #[error("Invalid value for [{section}] {key} = {value:?}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Errors installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("Invalid log filter: {0}")]
    Filter(String),

    /// The log file path has no file name.
    #[error("Invalid log file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A global subscriber is already installed.
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}
