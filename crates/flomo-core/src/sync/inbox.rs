//! Inbox resolver: the single child of a day-root that receives imported notes.

use crate::error::{Error, Result};
use crate::models::{Block, BlockContent, InsertPosition};
use crate::store::BlockStore;

fn is_inbox(block: &Block, inbox_name: &str) -> bool {
    block.text().map(str::trim) == Some(inbox_name)
}

/// Find the inbox under `day_root`, creating it as the last child when absent.
///
/// Locally cached children are checked first, in order; the remaining children
/// are fetched in one batch and scanned in their original order. The first
/// match wins.
pub async fn ensure_inbox<B: BlockStore>(
    store: &B,
    day_root: &Block,
    inbox_name: &str,
) -> Result<Block> {
    let mut uncached = Vec::new();

    for child in &day_root.children {
        match store.cached_block(*child) {
            Some(block) if is_inbox(&block, inbox_name) => return Ok(block),
            Some(_) => {}
            None => uncached.push(*child),
        }
    }

    if !uncached.is_empty() {
        let fetched = store.get_blocks(&uncached).await?;
        if let Some(inbox) = fetched.into_iter().find(|block| is_inbox(block, inbox_name)) {
            return Ok(inbox);
        }
    }

    let id = store
        .insert_block(
            day_root.id,
            InsertPosition::LastChild,
            BlockContent::text(inbox_name),
            None,
        )
        .await?;
    tracing::debug!(day_root = %day_root.id, inbox = %id, "Created inbox");

    match store.cached_block(id) {
        Some(block) => Ok(block),
        None => store
            .get_block(id)
            .await?
            .ok_or_else(|| Error::Store(format!("inbox block {id} vanished after insert"))),
    }
}
