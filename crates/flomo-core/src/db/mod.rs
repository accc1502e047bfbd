//! Database layer for Flomo Sync

mod connection;
mod migrations;
mod settings_repository;
mod state_repository;

pub use connection::Database;
pub use settings_repository::{SettingsRepository, SqliteSettingsRepository};
pub use state_repository::SqliteStateStore;
