//! Core error types for taskpulse-core.
//!
//! Bad task data never surfaces as an error: the pressure, estimation and
//! scheduling entry points recover with documented defaults. The types here
//! cover configuration and store I/O, plus the typed "why did we fall back"
//! errors that the fallible variants of the pure functions return.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for taskpulse-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pattern/settings store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors raised by a [`crate::storage::PatternStore`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading the backing file failed
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the backing file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored content could not be decoded
    #[error("Corrupt entry '{key}': {message}")]
    Corrupt { key: String, message: String },
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Time of day not in HH:MM form
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTimeOfDay(String),

    /// Hour outside 0..24
    #[error("Invalid hour {0}: expected 0-23")]
    InvalidHour(u32),

    /// UTC offset outside the range chrono accepts
    #[error("Invalid UTC offset of {0} minutes")]
    InvalidOffset(i32),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Why a task could not be classified normally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PressureError {
    /// The task carries no deadline (or it failed to parse)
    #[error("task '{task_id}' has no deadline")]
    MissingDeadline { task_id: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::InvalidValue {
            key: "<document>".to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
