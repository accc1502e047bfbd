//! Note source contract and adapters.
//!
//! A source owns the capture session (the surface that talks to the external
//! service), knows whether the user is logged in, and serves notes newer than
//! a cursor plus the binary payloads of their attached files.

mod export_dir;
mod memory;

use crate::error::Result;
use crate::models::Note;

pub use export_dir::{ExportDirSource, MEMOS_FILE};
pub use memory::MemorySource;

/// Binary payload of an attached file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Trait for note source operations (async)
#[allow(async_fn_in_trait)]
pub trait NoteSource {
    /// Acquire the capture session used for the rest of a run
    async fn open_session(&self) -> Result<()>;

    /// Release the capture session; called on every exit path
    async fn close_session(&self) -> Result<()>;

    /// Whether the user is logged in to the external service
    async fn is_authenticated(&self) -> Result<bool>;

    /// Present the service's login surface to the user
    async fn request_login(&self) -> Result<()>;

    /// Notes with `updated_at_long` strictly greater than `cursor`, ascending by it.
    ///
    /// Soft-deleted notes are excluded. `Err(Error::SourceUnavailable)` signals
    /// that local storage could not be opened, which is distinct from an empty result.
    async fn fetch_notes_since(&self, cursor: Option<i64>) -> Result<Vec<Note>>;

    /// Fetch an attached file's payload and media type
    async fn fetch_binary(&self, url: &str) -> Result<Binary>;
}
