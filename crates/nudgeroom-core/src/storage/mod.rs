mod config;
pub mod database;
mod kv;

pub use config::{Config, LimitsConfig, QuietHoursConfig, SchedulerConfig, TriggersConfig};
pub use database::SqliteStore;
pub use kv::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Key holding the persisted user settings.
pub const SETTINGS_KEY: &str = "nudge.settings";
/// Key holding the nudge history array.
pub const HISTORY_KEY: &str = "nudge.history";
/// Key holding the guard's cooldown and counter state.
pub const GUARD_STATE_KEY: &str = "nudge.guard_state";

/// Abstract key-value store the engine persists into.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value.
///
/// Missing keys, read errors and corrupt data all yield `None`; the latter
/// two are logged.
pub fn read_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read from store");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding corrupt stored value");
            None
        }
    }
}

/// Encode and write a JSON value.
///
/// # Errors
/// Returns an error if encoding or the underlying write fails.
pub fn write_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Returns `~/.config/nudgeroom[-dev]/` based on NUDGEROOM_ENV.
///
/// Set NUDGEROOM_ENV=dev to use the development data directory, or
/// NUDGEROOM_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("NUDGEROOM_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("NUDGEROOM_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("nudgeroom-dev")
            } else {
                base_dir.join("nudgeroom")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
