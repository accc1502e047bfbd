//! In-memory note source.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Binary, NoteSource};
use crate::error::{Error, Result};
use crate::models::Note;

#[derive(Debug, Default)]
struct Contents {
    notes: Vec<Note>,
    binaries: HashMap<String, Binary>,
}

/// Note source backed by values held in memory
#[derive(Debug)]
pub struct MemorySource {
    contents: Mutex<Contents>,
    authenticated: AtomicBool,
    unavailable: AtomicBool,
    session_open: AtomicBool,
    sessions_opened: AtomicUsize,
    login_requests: AtomicUsize,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self {
            contents: Mutex::default(),
            authenticated: AtomicBool::new(true),
            unavailable: AtomicBool::new(false),
            session_open: AtomicBool::new(false),
            sessions_opened: AtomicUsize::new(0),
            login_requests: AtomicUsize::new(0),
        }
    }
}

impl MemorySource {
    /// Create a logged-in source with no notes
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Contents> {
        self.contents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the notes the source serves
    pub fn set_notes(&self, notes: Vec<Note>) {
        self.lock().notes = notes;
    }

    /// Serve `bytes` for `url`
    pub fn add_binary(&self, url: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) {
        self.lock().binaries.insert(
            url.into(),
            Binary {
                media_type: media_type.into(),
                bytes,
            },
        );
    }

    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Make note fetches fail as if local storage could not be opened
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn is_session_open(&self) -> bool {
        self.session_open.load(Ordering::SeqCst)
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.load(Ordering::SeqCst)
    }

    pub fn login_requests(&self) -> usize {
        self.login_requests.load(Ordering::SeqCst)
    }
}

impl NoteSource for MemorySource {
    async fn open_session(&self) -> Result<()> {
        self.session_open.store(true, Ordering::SeqCst);
        self.sessions_opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close_session(&self) -> Result<()> {
        self.session_open.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.authenticated.load(Ordering::SeqCst))
    }

    async fn request_login(&self) -> Result<()> {
        self.login_requests.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_notes_since(&self, cursor: Option<i64>) -> Result<Vec<Note>> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::SourceUnavailable(
                "note storage is not reachable".to_string(),
            ));
        }
        Ok(self
            .lock()
            .notes
            .iter()
            .filter(|note| cursor.map_or(true, |cursor| note.updated_at_long > cursor))
            .cloned()
            .collect())
    }

    async fn fetch_binary(&self, url: &str) -> Result<Binary> {
        self.lock()
            .binaries
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Source(format!("failed to fetch {url}")))
    }
}
