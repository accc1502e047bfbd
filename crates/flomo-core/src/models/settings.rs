//! Sync settings model

use chrono::{Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::util::normalize_text_option;

/// Default text of the block imported notes are placed under
pub const DEFAULT_INBOX_NAME: &str = "Flomo Inbox";

/// Default tag applied to imported notes
pub const DEFAULT_NOTE_TAG: &str = "Flomo Note";

/// User-facing sync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Text of the inbox block under each day
    pub inbox_name: String,
    /// Tag applied to every imported note
    pub note_tag: String,
    /// Notes before this date are never synced, even during a full sync
    pub after_date: Option<NaiveDate>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            inbox_name: DEFAULT_INBOX_NAME.to_string(),
            note_tag: DEFAULT_NOTE_TAG.to_string(),
            after_date: None,
        }
    }
}

impl SyncSettings {
    /// Replace blank names with their defaults and trim the rest
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            inbox_name: normalize_text_option(Some(self.inbox_name.clone()))
                .unwrap_or_else(|| DEFAULT_INBOX_NAME.to_string()),
            note_tag: normalize_text_option(Some(self.note_tag.clone()))
                .unwrap_or_else(|| DEFAULT_NOTE_TAG.to_string()),
            after_date: self.after_date,
        }
    }

    /// Date floor as a Unix timestamp in seconds, at local midnight
    #[must_use]
    pub fn date_floor(&self) -> Option<i64> {
        let midnight = self.after_date?.and_hms_opt(0, 0, 0)?;
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|instant| instant.timestamp())
    }
}
