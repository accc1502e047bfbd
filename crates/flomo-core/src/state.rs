//! Persisted plugin state.
//!
//! The sync cursor is the only checkpoint of a run. It is kept behind a small
//! trait so the orchestrator never reaches for process-wide globals.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::error::Result;

/// Key under which the sync cursor is stored
pub const SYNC_KEY: &str = "syncKey";

/// Trait for per-plugin named integer values (async)
#[allow(async_fn_in_trait)]
pub trait StateStore {
    /// Read a value; `None` when it was never written
    async fn get_value(&self, plugin: &str, key: &str) -> Result<Option<i64>>;

    /// Write a value, replacing any previous one
    async fn set_value(&self, plugin: &str, key: &str, value: i64) -> Result<()>;

    /// Forget a value
    async fn remove_value(&self, plugin: &str, key: &str) -> Result<()>;
}

/// In-memory `StateStore`
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<HashMap<(String, String), i64>>,
}

impl MemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    async fn get_value(&self, plugin: &str, key: &str) -> Result<Option<i64>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&(plugin.to_string(), key.to_string())).copied())
    }

    async fn set_value(&self, plugin: &str, key: &str, value: i64) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((plugin.to_string(), key.to_string()), value);
        Ok(())
    }

    async fn remove_value(&self, plugin: &str, key: &str) -> Result<()> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(plugin.to_string(), key.to_string()));
        Ok(())
    }
}
