//! Core error types for roastplan-core.
//!
//! Resolution, lane assignment, checklist flattening and alert polling never
//! fail. Errors only arise at the edges: reading configuration and recipe
//! tables from disk, and handing reminders to delivery collaborators.

use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

/// Error for operations that cross more than one edge, such as building a
/// plan from config.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Recipe table could not be loaded
    #[error("Recipe table error: {0}")]
    Table(#[from] TableError),

    /// The serve time falls in a local clock gap today
    #[error("{0} does not exist today in local time")]
    NoSuchLocalTime(NaiveTime),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the data directory
    #[error("Cannot prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Recipe table loading errors.
#[derive(Error, Debug)]
pub enum TableError {
    /// Failed to read the table file
    #[error("Failed to read recipe table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the table document
    #[error("Failed to parse recipe table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised by a delivery collaborator.
///
/// These are logged where they occur and never flow back into the
/// notification scheduler's state.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("Relay returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Spawning a helper process failed
    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Relay server or topic does not form a valid URL
    #[error("Invalid relay URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The capability is not available in this process
    #[error("{0} unavailable")]
    Unavailable(String),

    /// Local output failure (terminal bell)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
