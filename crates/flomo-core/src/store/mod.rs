//! Block store client contract and implementations.
//!
//! The reconciler never touches storage directly; it talks to a `BlockStore`.
//! Two implementations ship with the crate: `SqliteBlockStore` for the CLI
//! and `MemoryBlockStore`, which also models the host's local block cache.

mod html;
mod memory;
mod sqlite;

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{AssetRef, Block, BlockContent, BlockId, InsertPosition, Property, Timestamps};

pub use html::html_to_paragraphs;
pub use memory::MemoryBlockStore;
pub use sqlite::SqliteBlockStore;

/// Find blocks carrying `tag` whose tag instance has `property == value`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    pub tag: String,
    pub property: String,
    pub value: String,
    pub limit: usize,
}

impl TagQuery {
    /// Build a query that returns at most one block
    #[must_use]
    pub fn single(
        tag: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            property: property.into(),
            value: value.into(),
            limit: 1,
        }
    }
}

/// Trait for block store operations (async)
#[allow(async_fn_in_trait)]
pub trait BlockStore {
    /// Return a block only if it is already materialized locally; never hits storage
    fn cached_block(&self, id: BlockId) -> Option<Block>;

    /// Fetch one block by id
    async fn get_block(&self, id: BlockId) -> Result<Option<Block>>;

    /// Fetch several blocks in one call, in the order requested; unknown ids are skipped
    async fn get_blocks(&self, ids: &[BlockId]) -> Result<Vec<Block>>;

    /// Insert a block under `parent` and return its id
    async fn insert_block(
        &self,
        parent: BlockId,
        position: InsertPosition,
        content: BlockContent,
        timestamps: Option<Timestamps>,
    ) -> Result<BlockId>;

    /// Convert rich text into blocks and insert them, in document order, under `parent`
    async fn insert_html(
        &self,
        parent: BlockId,
        position: InsertPosition,
        html: &str,
    ) -> Result<Vec<BlockId>>;

    /// Delete blocks together with their descendants
    async fn delete_blocks(&self, ids: &[BlockId]) -> Result<()>;

    /// Insert or replace properties (matched by name) on each block
    async fn set_properties(&self, ids: &[BlockId], properties: &[Property]) -> Result<()>;

    /// Remove every tag reference from each block
    async fn clear_tags(&self, ids: &[BlockId]) -> Result<()>;

    /// Apply the named tag to `block`, creating the tag block when needed.
    ///
    /// `properties` are merged into the tag instance. Returns the tag block id.
    async fn insert_tag(&self, block: BlockId, tag: &str, properties: &[Property])
        -> Result<BlockId>;

    /// Run an indexed tag query
    async fn query(&self, query: &TagQuery) -> Result<Vec<BlockId>>;

    /// Day-root block for a calendar date, if the day exists
    async fn get_journal_block(&self, date: NaiveDate) -> Result<Option<Block>>;

    /// Start a grouped (atomic) batch of mutations
    async fn begin_group(&self) -> Result<()>;

    /// Make the current group's mutations permanent
    async fn commit_group(&self) -> Result<()>;

    /// Discard the current group's mutations
    async fn rollback_group(&self) -> Result<()>;

    /// Store a binary payload and return its store-local reference
    async fn upload_binary(&self, media_type: &str, bytes: &[u8]) -> Result<AssetRef>;
}

/// File extension used for an uploaded media type
pub(crate) fn extension_for(media_type: &str) -> &'static str {
    match media_type.split(';').next().unwrap_or_default().trim() {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "audio/mp4" | "audio/x-m4a" => "m4a",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        _ => "bin",
    }
}

/// Fresh asset reference for an uploaded payload
pub(crate) fn new_asset_ref(media_type: &str) -> AssetRef {
    AssetRef::new(format!(
        "assets/{}.{}",
        uuid::Uuid::now_v7(),
        extension_for(media_type)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_known_and_unknown_types() {
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("audio/mp4; codecs=mp4a"), "m4a");
        assert_eq!(extension_for("application/x-unknown"), "bin");
    }

    #[test]
    fn test_new_asset_refs_are_unique() {
        let first = new_asset_ref("image/jpeg");
        let second = new_asset_ref("image/jpeg");
        assert_ne!(first, second);
        assert!(first.as_str().starts_with("assets/"));
        assert!(first.as_str().ends_with(".jpg"));
    }
}
