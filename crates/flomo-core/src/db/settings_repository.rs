//! Settings repository implementation

use crate::error::{Error, Result};
use crate::models::SyncSettings;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

const INBOX_NAME_KEY: &str = "inbox_name";
const NOTE_TAG_KEY: &str = "note_tag";
const AFTER_DATE_KEY: &str = "after_date";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// Load settings from the database
    async fn load(&self) -> Result<SyncSettings>;

    /// Save settings to the database
    async fn save(&self, settings: &SyncSettings) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    async fn load(&self) -> Result<SyncSettings> {
        let mut settings = SyncSettings::default();

        if let Ok(value) = self.get_setting(INBOX_NAME_KEY) {
            settings.inbox_name = value;
        }

        if let Ok(value) = self.get_setting(NOTE_TAG_KEY) {
            settings.note_tag = value;
        }

        if let Ok(value) = self.get_setting(AFTER_DATE_KEY) {
            match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
                Ok(date) => settings.after_date = Some(date),
                Err(error) => {
                    tracing::warn!("Ignoring invalid after_date setting {value:?}: {error}");
                }
            }
        }

        Ok(settings.normalized())
    }

    async fn save(&self, settings: &SyncSettings) -> Result<()> {
        self.set_setting(INBOX_NAME_KEY, &settings.inbox_name)?;
        self.set_setting(NOTE_TAG_KEY, &settings.note_tag)?;
        match settings.after_date {
            Some(date) => {
                self.set_setting(AFTER_DATE_KEY, &date.format("%Y-%m-%d").to_string())?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM settings WHERE key = ?", [AFTER_DATE_KEY])?;
            }
        }
        Ok(())
    }
}

impl SqliteSettingsRepository<'_> {
    fn get_setting(&self, key: &str) -> Result<String> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}
