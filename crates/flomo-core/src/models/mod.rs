//! Data models for Flomo Sync

mod block;
mod note;
mod settings;

pub use block::{
    merge_properties, AssetRef, Block, BlockContent, BlockId, InsertPosition, Property,
    PropertyType, TagRef, Timestamps,
};
pub use note::{FileKind, Note, NoteFile, NoteId};
pub use settings::{SyncSettings, DEFAULT_INBOX_NAME, DEFAULT_NOTE_TAG};
