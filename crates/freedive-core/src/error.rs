//! Core error types for freedive-core.
//!
//! Table generation and session control never fail: rejected commands are
//! no-ops and out-of-range values are clamped. Errors only surface at the
//! edges -- configuration storage and parsing of user input.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for freedive-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// User input could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Errors raised while parsing names and values typed by a user.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// Not one of `co2`, `o2`, `one-breath`
    #[error("unknown table kind '{0}' (expected co2, o2 or one-breath)")]
    TableKind(String),

    /// Not a known parameter name
    #[error("unknown parameter '{0}'")]
    Parameter(String),

    /// Not a duration in `90`, `90s` or `1:30` form
    #[error("invalid duration '{0}' (expected seconds like 90 or 90s, or m:ss like 1:30)")]
    Duration(String),

    /// Assignment without `=`
    #[error("invalid assignment '{0}' (expected name=value)")]
    Assignment(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
