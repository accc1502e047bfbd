//! Note model
//!
//! A `Note` is immutable input produced by the note source. Its identity is the
//! external `id`, which stays stable across edits and re-syncs.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// External identifier of a note.
///
/// The source may hand out either strings or numbers; both are normalized to
/// their string form so they can be stored as a property value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Create a note ID from any displayable value
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for NoteId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for NoteId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for NoteId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// Kind of file attached to a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Audio,
    #[default]
    #[serde(other)]
    Other,
}

/// A file attached to a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteFile {
    /// Location the source can fetch the payload from
    pub url: String,
    /// Declared file kind
    #[serde(rename = "type", default)]
    pub kind: FileKind,
}

/// A note as delivered by the note source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable external identifier
    pub id: NoteId,
    /// Short title
    pub slug: String,
    /// Rich text body (HTML)
    pub content: String,
    /// Creation instant, in the offset the note was written in
    pub created_at: DateTime<FixedOffset>,
    /// Last update instant
    pub updated_at: DateTime<FixedOffset>,
    /// Sync ordering key, finer grained than `updated_at`
    pub updated_at_long: i64,
    /// Labels in source order
    #[serde(default)]
    pub tags: Vec<String>,
    /// Attached files in source order
    #[serde(default)]
    pub files: Vec<NoteFile>,
}

impl Note {
    /// Calendar day the note belongs to, evaluated in the note's own offset.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}
