//! Note reconciler: upserts one note into an inbox.

use chrono::Utc;

use super::asset::import_asset;
use crate::error::Result;
use crate::models::{
    Block, BlockContent, BlockId, InsertPosition, Note, Property, PropertyType, Timestamps,
};
use crate::source::NoteSource;
use crate::store::{BlockStore, TagQuery};

/// Tag-instance property linking a record to its note
pub const ID_PROPERTY: &str = "ID";

/// What happened to a single note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Created(BlockId),
    Updated(BlockId),
    /// The dedup index pointed at a record that no longer resolves
    Skipped,
}

async fn find_record<B: BlockStore>(
    store: &B,
    note: &Note,
    note_tag: &str,
) -> Result<Option<Option<Block>>> {
    let hits = store
        .query(&TagQuery::single(note_tag, ID_PROPERTY, note.id.as_str()))
        .await?;
    let Some(id) = hits.first().copied() else {
        return Ok(None);
    };
    if let Some(block) = store.cached_block(id) {
        return Ok(Some(Some(block)));
    }
    Ok(Some(store.get_block(id).await?))
}

/// Create or update the record of `note` under `inbox`.
///
/// Asset failures only drop the affected file. Every other store failure is
/// returned so the caller can abort the grouped batch.
pub async fn reconcile_note<B, S>(
    store: &B,
    source: &S,
    note: &Note,
    inbox: &Block,
    note_tag: &str,
) -> Result<ReconcileOutcome>
where
    B: BlockStore,
    S: NoteSource,
{
    let (record, outcome) = match find_record(store, note, note_tag).await? {
        Some(Some(existing)) => {
            store.clear_tags(&[existing.id]).await?;
            if !existing.children.is_empty() {
                store.delete_blocks(&existing.children).await?;
            }
            (existing.id, ReconcileOutcome::Updated(existing.id))
        }
        Some(None) => {
            tracing::warn!(note = %note.id, "Indexed record no longer resolves, skipping note");
            return Ok(ReconcileOutcome::Skipped);
        }
        None => {
            let timestamps = Timestamps {
                created: note.created_at.with_timezone(&Utc),
                modified: note.updated_at.with_timezone(&Utc),
            };
            let id = store
                .insert_block(
                    inbox.id,
                    InsertPosition::LastChild,
                    BlockContent::text(note.slug.clone()),
                    Some(timestamps),
                )
                .await?;
            (id, ReconcileOutcome::Created(id))
        }
    };

    let tag_block = store
        .insert_tag(
            record,
            note_tag,
            &[Property::identifier(ID_PROPERTY, note.id.as_str())],
        )
        .await?;
    declare_id_property(store, tag_block).await?;

    for label in &note.tags {
        store.insert_tag(record, label, &[]).await?;
    }

    for file in &note.files {
        if let Some(asset) = import_asset(store, source, &file.url).await? {
            store
                .insert_block(
                    record,
                    InsertPosition::FirstChild,
                    BlockContent::media(file.kind, asset),
                    None,
                )
                .await?;
        }
    }

    store
        .insert_html(record, InsertPosition::FirstChild, &note.content)
        .await?;

    tracing::debug!(note = %note.id, record = %record, ?outcome, "Reconciled note");
    Ok(outcome)
}

/// Declare the `ID` schema on the tag block unless it already carries one
async fn declare_id_property<B: BlockStore>(store: &B, tag_block: BlockId) -> Result<()> {
    let block = match store.cached_block(tag_block) {
        Some(block) => Some(block),
        None => store.get_block(tag_block).await?,
    };
    if block.is_some_and(|block| block.property(ID_PROPERTY).is_some()) {
        return Ok(());
    }
    store
        .set_properties(
            &[tag_block],
            &[Property::declaration(ID_PROPERTY, PropertyType::Identifier)],
        )
        .await
}
