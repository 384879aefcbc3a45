//! Core error types for affirm-core.
//!
//! This module defines the error hierarchy using thiserror. Every failure
//! the library can produce is recoverable; callers decide whether to surface
//! it as a notice or silently no-op.

use std::path::PathBuf;
use thiserror::Error;

use crate::settings::SettingsId;

/// Core error type for affirm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Import/export errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Speech engine errors
    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The durable backend could not be opened
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// No record with the given id
    #[error("Settings record '{0}' not found")]
    NotFound(SettingsId),

    /// Query or write failed after the backend was opened
    #[error("Backend failure: {0}")]
    Backend(String),

    /// A stored record could not be decoded
    #[error("Stored record '{id}' is corrupt: {message}")]
    Corrupt { id: String, message: String },
}

/// Import failures. The store is never modified when one of these is returned.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Not JSON, or JSON of an unrecognized shape
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Envelope carries a version this build does not understand
    #[error("Unsupported export version: {0}")]
    UnsupportedVersion(String),

    /// Shape was fine but the record itself is unusable
    #[error("Invalid settings record: {0}")]
    InvalidRecord(#[from] ValidationError),

    /// Persisting the imported record failed
    #[error("Failed to store imported record: {0}")]
    Store(#[from] StoreError),
}

/// Validation errors for user-edited or imported settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Affirmation text is blank
    #[error("affirmation_text must not be empty")]
    EmptyText,

    /// A goal was zero
    #[error("{field} must be a positive integer")]
    NonPositiveGoal { field: &'static str },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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

    /// Key does not exist in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Speech engine errors.
#[derive(Error, Debug)]
pub enum SpeechError {
    /// Nothing to speak yet
    #[error("No utterance configured")]
    NoUtterance,

    /// The engine refused or failed to speak
    #[error("Speech engine failure: {0}")]
    Engine(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Backend(format!("storage task failed: {err}"))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
