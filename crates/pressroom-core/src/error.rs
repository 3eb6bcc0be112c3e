//! Core error types for pressroom-core.
//!
//! Every fallible collaborator (storage, settings validation, audio, config)
//! has its own error enum. `CoreError` wraps the ones that can reach the CLI;
//! audio errors never leave the notification dispatcher.

use std::path::PathBuf;
use thiserror::Error;

/// Message shown to the user when a settings save is rejected.
pub const INVALID_TIMES_MESSAGE: &str =
    "Please enter valid times. Each timer must be between 1 second and 30 minutes.";

/// Core error type for pressroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Key-value store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Settings validation errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WAV encoding errors
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Store is locked")]
    Locked,

    /// Store cannot be reached at all (no data dir, injected failure, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Settings validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// One or both durations are unparseable or outside (0, 1800] seconds.
    #[error("{}", INVALID_TIMES_MESSAGE)]
    Invalid,
}

/// Audio layer errors. None of these ever escape the notification dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// The capability is not present at all
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    /// A pre-rendered clip could not be loaded
    #[error("failed to load clip '{clip}': {message}")]
    ClipLoad { clip: String, message: String },

    /// The backend refused to play
    #[error("playback rejected: {0}")]
    Playback(String),

    /// Tone synthesis failed
    #[error("tone synthesis failed: {0}")]
    Synthesis(String),
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

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_error_displays_fixed_message() {
        assert_eq!(SettingsError::Invalid.to_string(), INVALID_TIMES_MESSAGE);
    }

    #[test]
    fn store_error_wraps_into_core_error() {
        let err: CoreError = StoreError::Locked.into();
        assert_eq!(err.to_string(), "Store error: Store is locked");
    }

    #[test]
    fn rejected_settings_keep_the_fixed_message() {
        let err: CoreError = SettingsError::Invalid.into();
        assert!(err.to_string().ends_with(INVALID_TIMES_MESSAGE));
    }

    #[test]
    fn config_errors_name_the_key() {
        let err: CoreError = ConfigError::UnknownKey("alerts.nope".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration key: alerts.nope"
        );
    }
}
