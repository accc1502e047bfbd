//! In-process block store.
//!
//! Keeps the whole graph in memory and tracks which blocks are "materialized"
//! locally, the way a host editor keeps recently touched blocks in its state.
//! Blocks that were evicted are still stored but only reachable through the
//! fetching calls, which lets callers exercise both lookup paths.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{NaiveDate, Utc};

use super::{html_to_paragraphs, new_asset_ref, BlockStore, TagQuery};
use crate::error::{Error, Result};
use crate::models::{
    merge_properties, AssetRef, Block, BlockContent, BlockId, InsertPosition, Property, TagRef,
    Timestamps,
};

#[derive(Debug, Clone, Default)]
struct Graph {
    next_id: i64,
    blocks: BTreeMap<BlockId, Block>,
    tags_by_name: HashMap<String, BlockId>,
    journals: HashMap<NaiveDate, BlockId>,
    assets: HashMap<AssetRef, (String, Vec<u8>)>,
    cached: HashSet<BlockId>,
    unresolvable: HashSet<BlockId>,
}

#[derive(Debug, Default)]
struct Inner {
    graph: Graph,
    snapshot: Option<Graph>,
    fail_html_inserts: bool,
    mutations: usize,
}

/// Block store that lives entirely in memory
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    inner: Mutex<Inner>,
}

impl MemoryBlockStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create the day-root block for `date`, or return the existing one
    pub fn create_journal(&self, date: NaiveDate) -> BlockId {
        let mut inner = self.lock();
        if let Some(id) = inner.graph.journals.get(&date) {
            return *id;
        }
        let id = inner
            .graph
            .new_block(None, BlockContent::text(date.format("%Y-%m-%d").to_string()), None);
        inner.graph.journals.insert(date, id);
        id
    }

    /// Drop a block from the local cache without deleting it
    pub fn evict(&self, id: BlockId) {
        self.lock().graph.cached.remove(&id);
    }

    /// Drop every block from the local cache
    pub fn evict_all(&self) {
        self.lock().graph.cached.clear();
    }

    /// Make subsequent HTML inserts fail, for exercising rollback paths
    pub fn fail_html_inserts(&self, fail: bool) {
        self.lock().fail_html_inserts = fail;
    }

    /// Number of mutating calls that succeeded since creation
    pub fn mutation_count(&self) -> usize {
        self.lock().mutations
    }

    /// Every stored block, ordered by id
    pub fn blocks(&self) -> Vec<Block> {
        self.lock().graph.blocks.values().cloned().collect()
    }

    /// Media type and payload of an uploaded asset
    pub fn asset(&self, asset: &AssetRef) -> Option<(String, Vec<u8>)> {
        self.lock().graph.assets.get(asset).cloned()
    }

    /// Make a block unreachable by id while queries keep returning it.
    ///
    /// Simulates a query index that lags behind deletions.
    pub fn forget(&self, id: BlockId) {
        let mut inner = self.lock();
        inner.graph.cached.remove(&id);
        inner.graph.unresolvable.insert(id);
    }
}

impl Graph {
    fn new_block(
        &mut self,
        parent: Option<BlockId>,
        content: BlockContent,
        timestamps: Option<Timestamps>,
    ) -> BlockId {
        self.next_id += 1;
        let id = BlockId(self.next_id);
        let now = Utc::now();
        let (created, modified) = timestamps.map_or((now, now), |t| (t.created, t.modified));
        self.blocks.insert(
            id,
            Block {
                id,
                parent,
                content,
                children: Vec::new(),
                properties: Vec::new(),
                tags: Vec::new(),
                created,
                modified,
            },
        );
        self.cached.insert(id);
        id
    }

    fn resolve(&self, id: BlockId) -> Option<&Block> {
        if self.unresolvable.contains(&id) {
            None
        } else {
            self.blocks.get(&id)
        }
    }

    fn block_mut(&mut self, id: BlockId) -> Result<&mut Block> {
        self.blocks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("block {id}")))
    }

    fn insert_child(
        &mut self,
        parent: BlockId,
        position: InsertPosition,
        content: BlockContent,
        timestamps: Option<Timestamps>,
    ) -> Result<BlockId> {
        self.block_mut(parent)?;
        let id = self.new_block(Some(parent), content, timestamps);
        let parent = self.block_mut(parent)?;
        match position {
            InsertPosition::FirstChild => parent.children.insert(0, id),
            InsertPosition::LastChild => parent.children.push(id),
        }
        Ok(id)
    }

    fn remove_subtree(&mut self, id: BlockId) {
        let Some(block) = self.blocks.remove(&id) else {
            return;
        };
        self.cached.remove(&id);
        for child in block.children {
            self.remove_subtree(child);
        }
    }

    fn tag_block(&mut self, name: &str) -> BlockId {
        if let Some(id) = self.tags_by_name.get(name) {
            return *id;
        }
        let id = self.new_block(None, BlockContent::text(name), None);
        self.tags_by_name.insert(name.to_string(), id);
        id
    }
}

impl BlockStore for MemoryBlockStore {
    fn cached_block(&self, id: BlockId) -> Option<Block> {
        let inner = self.lock();
        if inner.graph.cached.contains(&id) {
            inner.graph.resolve(id).cloned()
        } else {
            None
        }
    }

    async fn get_block(&self, id: BlockId) -> Result<Option<Block>> {
        let mut inner = self.lock();
        let block = inner.graph.resolve(id).cloned();
        if block.is_some() {
            inner.graph.cached.insert(id);
        }
        Ok(block)
    }

    async fn get_blocks(&self, ids: &[BlockId]) -> Result<Vec<Block>> {
        let inner = self.lock();
        Ok(ids
            .iter()
            .filter_map(|id| inner.graph.resolve(*id).cloned())
            .collect())
    }

    async fn insert_block(
        &self,
        parent: BlockId,
        position: InsertPosition,
        content: BlockContent,
        timestamps: Option<Timestamps>,
    ) -> Result<BlockId> {
        let mut inner = self.lock();
        let id = inner
            .graph
            .insert_child(parent, position, content, timestamps)?;
        inner.mutations += 1;
        Ok(id)
    }

    async fn insert_html(
        &self,
        parent: BlockId,
        position: InsertPosition,
        html: &str,
    ) -> Result<Vec<BlockId>> {
        let mut inner = self.lock();
        if inner.fail_html_inserts {
            return Err(Error::Store(format!(
                "failed to insert rich text under block {parent}"
            )));
        }
        inner.graph.block_mut(parent)?;

        let mut ids = Vec::new();
        for paragraph in html_to_paragraphs(html) {
            let id = inner
                .graph
                .new_block(Some(parent), BlockContent::text(paragraph), None);
            ids.push(id);
        }
        let parent = inner.graph.block_mut(parent)?;
        match position {
            InsertPosition::FirstChild => {
                parent.children.splice(0..0, ids.iter().copied());
            }
            InsertPosition::LastChild => parent.children.extend(ids.iter().copied()),
        }
        inner.mutations += 1;
        Ok(ids)
    }

    async fn delete_blocks(&self, ids: &[BlockId]) -> Result<()> {
        let mut inner = self.lock();
        for id in ids {
            let parent = inner.graph.blocks.get(id).and_then(|block| block.parent);
            if let Some(parent) = parent.and_then(|parent| inner.graph.blocks.get_mut(&parent)) {
                parent.children.retain(|child| child != id);
            }
            inner.graph.remove_subtree(*id);
        }
        inner.mutations += 1;
        Ok(())
    }

    async fn set_properties(&self, ids: &[BlockId], properties: &[Property]) -> Result<()> {
        let mut inner = self.lock();
        for id in ids {
            let block = inner.graph.block_mut(*id)?;
            merge_properties(&mut block.properties, properties);
        }
        inner.mutations += 1;
        Ok(())
    }

    async fn clear_tags(&self, ids: &[BlockId]) -> Result<()> {
        let mut inner = self.lock();
        for id in ids {
            inner.graph.block_mut(*id)?.tags.clear();
        }
        inner.mutations += 1;
        Ok(())
    }

    async fn insert_tag(
        &self,
        block: BlockId,
        tag: &str,
        properties: &[Property],
    ) -> Result<BlockId> {
        let mut inner = self.lock();
        inner.graph.block_mut(block)?;
        let tag_id = inner.graph.tag_block(tag);
        let target = inner.graph.block_mut(block)?;
        if let Some(existing) = target.tags.iter_mut().find(|t| t.tag == tag_id) {
            merge_properties(&mut existing.data, properties);
        } else {
            target.tags.push(TagRef {
                tag: tag_id,
                name: tag.to_string(),
                data: properties.to_vec(),
            });
        }
        inner.mutations += 1;
        Ok(tag_id)
    }

    async fn query(&self, query: &TagQuery) -> Result<Vec<BlockId>> {
        let inner = self.lock();
        let Some(tag_id) = inner.graph.tags_by_name.get(&query.tag) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<BlockId> = inner
            .graph
            .blocks
            .values()
            .filter(|block| {
                block.tags.iter().any(|tag| {
                    tag.tag == *tag_id && tag.value_of(&query.property) == Some(query.value.as_str())
                })
            })
            .map(|block| block.id)
            .collect();
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn get_journal_block(&self, date: NaiveDate) -> Result<Option<Block>> {
        let inner = self.lock();
        Ok(inner
            .graph
            .journals
            .get(&date)
            .and_then(|id| inner.graph.resolve(*id))
            .cloned())
    }

    async fn begin_group(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.snapshot.is_some() {
            return Err(Error::Store("a grouped batch is already open".to_string()));
        }
        inner.snapshot = Some(inner.graph.clone());
        Ok(())
    }

    async fn commit_group(&self) -> Result<()> {
        let mut inner = self.lock();
        inner
            .snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| Error::Store("no grouped batch to commit".to_string()))
    }

    async fn rollback_group(&self) -> Result<()> {
        let mut inner = self.lock();
        let snapshot = inner
            .snapshot
            .take()
            .ok_or_else(|| Error::Store("no grouped batch to roll back".to_string()))?;
        inner.graph = snapshot;
        Ok(())
    }

    async fn upload_binary(&self, media_type: &str, bytes: &[u8]) -> Result<AssetRef> {
        let mut inner = self.lock();
        let asset = new_asset_ref(media_type);
        inner
            .graph
            .assets
            .insert(asset.clone(), (media_type.to_string(), bytes.to_vec()));
        inner.mutations += 1;
        Ok(asset)
    }
}
