//! Core error types for nudgeroom-core.
//!
//! This module defines the error hierarchy using thiserror. Most engine
//! paths degrade instead of failing (a bad trigger or an unreadable store
//! never stops a tick), so these types mainly surface at the edges: config
//! loading, explicit storage calls and trigger evaluation.

use std::path::PathBuf;
use thiserror::Error;

use crate::nudge::NudgeType;

/// Core error type for nudgeroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Trigger evaluation errors
    #[error("Trigger error: {0}")]
    Trigger(#[from] TriggerError),

    /// Push delivery errors
    #[error("Push error: {0}")]
    Push(#[from] PushError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Key-value storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

    /// Stored value could not be encoded
    #[error("Failed to encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
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

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors raised by a single trigger evaluation.
///
/// The engine discards the failing trigger's result for the tick and keeps
/// evaluating the others.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// Context data the trigger depends on is inconsistent
    #[error("{kind} trigger saw malformed context: {message}")]
    MalformedContext { kind: NudgeType, message: String },

    /// The trigger panicked
    #[error("{kind} trigger panicked: {message}")]
    Panicked { kind: NudgeType, message: String },
}

/// Push channel delivery failures.
///
/// These never escape a tick; the dispatcher records them as "not displayed".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The user has not granted notification permission
    #[error("notification permission denied")]
    PermissionDenied,

    /// No push backend is available on this platform
    #[error("push channel unavailable")]
    Unavailable,

    /// The backend rejected or failed to show the notification
    #[error("push failed: {0}")]
    Failed(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
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
    fn storage_error_wraps_into_core_error() {
        let err: CoreError = StorageError::Locked.into();
        assert_eq!(err.to_string(), "Storage error: Database is locked");
    }

    #[test]
    fn trigger_error_names_the_trigger() {
        let err = TriggerError::MalformedContext {
            kind: NudgeType::MeetingReminder,
            message: "event ends before it starts".into(),
        };
        assert!(err.to_string().starts_with("meeting_reminder trigger"));
    }

    #[test]
    fn sqlite_no_rows_maps_to_query_failed() {
        let err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StorageError::QueryFailed(_)));
    }
}
