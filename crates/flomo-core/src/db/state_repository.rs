//! Plugin data repository implementation

use crate::error::Result;
use crate::state::StateStore;
use rusqlite::{params, Connection, OptionalExtension};

/// `SQLite` implementation of `StateStore`, backed by the `plugin_data` table
pub struct SqliteStateStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStateStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl StateStore for SqliteStateStore<'_> {
    async fn get_value(&self, plugin: &str, key: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM plugin_data WHERE plugin = ? AND key = ?",
                params![plugin, key],
                |row| row.get(0),
            )
            .optional()?)
    }

    async fn set_value(&self, plugin: &str, key: &str, value: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO plugin_data (plugin, key, value) VALUES (?, ?, ?)",
            params![plugin, key, value],
        )?;
        Ok(())
    }

    async fn remove_value(&self, plugin: &str, key: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM plugin_data WHERE plugin = ? AND key = ?",
            params![plugin, key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::state::SYNC_KEY;

    #[tokio::test]
    async fn test_values_are_scoped_by_plugin() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteStateStore::new(db.connection());

        store.set_value("flomo", SYNC_KEY, 200).await.unwrap();

        assert_eq!(store.get_value("flomo", SYNC_KEY).await.unwrap(), Some(200));
        assert_eq!(store.get_value("other", SYNC_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_remove_clears() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteStateStore::new(db.connection());

        store.set_value("flomo", SYNC_KEY, 1).await.unwrap();
        store.set_value("flomo", SYNC_KEY, 2).await.unwrap();
        assert_eq!(store.get_value("flomo", SYNC_KEY).await.unwrap(), Some(2));

        store.remove_value("flomo", SYNC_KEY).await.unwrap();
        assert_eq!(store.get_value("flomo", SYNC_KEY).await.unwrap(), None);
    }
}
