use chrono::NaiveDate;
use flomo_core::db::{SettingsRepository, SqliteSettingsRepository};
use flomo_core::SyncSettings;

use crate::commands::common::Context;
use crate::error::CliError;

/// Changes requested by `settings set`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub inbox_name: Option<String>,
    pub note_tag: Option<String>,
    pub after_date: Option<NaiveDate>,
    pub clear_after_date: bool,
}

impl SettingsUpdate {
    pub const fn is_empty(&self) -> bool {
        self.inbox_name.is_none()
            && self.note_tag.is_none()
            && self.after_date.is_none()
            && !self.clear_after_date
    }

    pub fn apply(self, settings: &SyncSettings) -> SyncSettings {
        let mut updated = settings.clone();
        if let Some(inbox_name) = self.inbox_name {
            updated.inbox_name = inbox_name;
        }
        if let Some(note_tag) = self.note_tag {
            updated.note_tag = note_tag;
        }
        if self.clear_after_date {
            updated.after_date = None;
        } else if let Some(after_date) = self.after_date {
            updated.after_date = Some(after_date);
        }
        updated.normalized()
    }
}

pub async fn run_settings_show(context: &Context, as_json: bool) -> Result<(), CliError> {
    let db = context.open_database()?;
    let settings = SqliteSettingsRepository::new(db.connection()).load().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&settings)?);
    } else {
        for line in format_settings_lines(&settings) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_settings_set(context: &Context, update: SettingsUpdate) -> Result<(), CliError> {
    if update.is_empty() {
        return Err(CliError::NoSettingsChange);
    }

    let db = context.open_database()?;
    let repository = SqliteSettingsRepository::new(db.connection());
    let settings = update.apply(&repository.load().await?);
    repository.save(&settings).await?;

    for line in format_settings_lines(&settings) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_settings_lines(settings: &SyncSettings) -> Vec<String> {
    vec![
        format!("inbox_name: {}", settings.inbox_name),
        format!("note_tag:   {}", settings.note_tag),
        format!(
            "after_date: {}",
            settings
                .after_date
                .map_or_else(|| "(none)".to_string(), |date| date.format("%Y-%m-%d").to_string())
        ),
    ]
}
