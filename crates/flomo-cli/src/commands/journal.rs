use std::fmt::Write;

use chrono::NaiveDate;
use flomo_core::models::BlockContent;
use flomo_core::store::{BlockStore, SqliteBlockStore};
use flomo_core::Block;

use crate::commands::common::Context;
use crate::error::CliError;

pub fn run_journal_create(context: &Context, date: NaiveDate) -> Result<(), CliError> {
    let db = context.open_database()?;
    let id = SqliteBlockStore::new(db.connection()).create_journal_block(date)?;
    println!("Journal {} ready (block {id})", date.format("%Y-%m-%d"));
    Ok(())
}

pub async fn run_journal_show(context: &Context, date: NaiveDate) -> Result<(), CliError> {
    let db = context.open_database()?;
    let store = SqliteBlockStore::new(db.connection());
    let root = store
        .get_journal_block(date)
        .await?
        .ok_or(CliError::JournalNotFound(date))?;

    for line in render_tree(&store, root).await? {
        println!("{line}");
    }
    Ok(())
}

/// Depth-first outline of `root` and its descendants
pub async fn render_tree<B: BlockStore>(store: &B, root: Block) -> Result<Vec<String>, CliError> {
    let mut lines = Vec::new();
    let mut pending = vec![(root, 0_usize)];

    while let Some((block, depth)) = pending.pop() {
        lines.push(format!("{}- {}", "  ".repeat(depth), format_block(&block)));
        let children = store.get_blocks(&block.children).await?;
        pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }

    Ok(lines)
}

pub fn format_block(block: &Block) -> String {
    let mut line = match &block.content {
        BlockContent::Text { text } => text.clone(),
        BlockContent::Image { src } => format!("[image] {src}"),
        BlockContent::Audio { src } => format!("[audio] {src}"),
    };
    for tag in &block.tags {
        line.push_str(" #");
        line.push_str(&tag.name);
        for property in &tag.data {
            if let Some(value) = &property.value {
                let _ = write!(line, " {}={value}", property.name);
            }
        }
    }
    line
}
