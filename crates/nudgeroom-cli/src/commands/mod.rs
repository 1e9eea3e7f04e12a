pub mod config;
pub mod engine;
pub mod history;
pub mod preset;

use std::sync::Arc;

use nudgeroom_core::{Config, HistoryStore, KvStore, SqliteStore};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// The on-disk key-value store shared by history and the engine.
pub fn open_store() -> Result<Arc<dyn KvStore>, Box<dyn std::error::Error>> {
    Ok(Arc::new(SqliteStore::open()?))
}

pub fn open_history(config: &Config) -> Result<HistoryStore, Box<dyn std::error::Error>> {
    Ok(HistoryStore::with_limit(
        open_store()?,
        config.scheduler.history_limit,
    ))
}
