//! Note source reading a directory exported from the capture service.
//!
//! The directory holds `memos.json`, a JSON array of memo records in the shape
//! the service keeps in its local storage, plus the attached files referenced
//! by relative path or `file://` URL.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::Deserialize;

use super::{Binary, NoteSource};
use crate::error::{Error, Result};
use crate::models::{Note, NoteFile, NoteId};
use crate::util::compact_text;

/// Name of the memo dump inside an export directory
pub const MEMOS_FILE: &str = "memos.json";

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Note source over an export directory
#[derive(Debug, Clone)]
pub struct ExportDirSource {
    root: PathBuf,
}

impl ExportDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory this source reads from
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, url: &str) -> Result<PathBuf> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Err(Error::Source(format!(
                "remote file {url} is not part of the export"
            )));
        }
        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.root.join(path))
        }
    }
}

#[derive(Debug, Deserialize)]
struct MemoRecord {
    id: NoteId,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    content: String,
    created_at: String,
    updated_at: String,
    updated_at_long: i64,
    #[serde(default)]
    deleted_at: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    files: Vec<NoteFile>,
}

impl TryFrom<MemoRecord> for Note {
    type Error = Error;

    fn try_from(record: MemoRecord) -> Result<Self> {
        Ok(Self {
            created_at: parse_instant(&record.created_at)?,
            updated_at: parse_instant(&record.updated_at)?,
            id: record.id,
            slug: record.slug,
            content: record.content,
            updated_at_long: record.updated_at_long,
            tags: record.tags,
            files: record.files,
        })
    }
}

/// Parse an RFC 3339 instant, or a naive `YYYY-MM-DD HH:MM:SS` in local time
fn parse_instant(value: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant);
    }
    let naive = NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMAT)
        .map_err(|error| Error::InvalidInput(format!("invalid timestamp {value:?}: {error}")))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|instant| instant.fixed_offset())
        .ok_or_else(|| Error::InvalidInput(format!("timestamp {value:?} does not exist locally")))
}

/// Memo records newer than `cursor`, without deleted ones, ascending by `updated_at_long`
fn select_notes(records: Vec<MemoRecord>, cursor: Option<i64>) -> Result<Vec<Note>> {
    let mut notes = records
        .into_iter()
        .filter(|record| record.deleted_at.is_none())
        .filter(|record| cursor.map_or(true, |cursor| record.updated_at_long > cursor))
        .map(Note::try_from)
        .collect::<Result<Vec<_>>>()?;
    notes.sort_by_key(|note| note.updated_at_long);
    Ok(notes)
}

fn media_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}

impl NoteSource for ExportDirSource {
    async fn open_session(&self) -> Result<()> {
        tracing::debug!("Opening export directory {}", self.root.display());
        Ok(())
    }

    async fn close_session(&self) -> Result<()> {
        tracing::debug!("Closing export directory {}", self.root.display());
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.root.is_dir())
    }

    async fn request_login(&self) -> Result<()> {
        tracing::warn!(
            "Export your Flomo notes into {} and run the sync again",
            self.root.display()
        );
        Ok(())
    }

    async fn fetch_notes_since(&self, cursor: Option<i64>) -> Result<Vec<Note>> {
        let path = self.root.join(MEMOS_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|error| {
            Error::SourceUnavailable(format!("failed to open {}: {error}", path.display()))
        })?;
        let records: Vec<MemoRecord> = serde_json::from_str(&raw).map_err(|error| {
            Error::SourceUnavailable(format!(
                "failed to read {}: {}",
                path.display(),
                compact_text(&error.to_string())
            ))
        })?;

        let notes = select_notes(records, cursor)?;
        tracing::debug!("Loaded {} notes newer than {cursor:?}", notes.len());
        Ok(notes)
    }

    async fn fetch_binary(&self, url: &str) -> Result<Binary> {
        let path = self.resolve(url)?;
        let bytes = std::fs::read(&path)
            .map_err(|error| Error::Source(format!("failed to read {}: {error}", path.display())))?;
        Ok(Binary {
            media_type: media_type_for(&path).to_string(),
            bytes,
        })
    }
}
