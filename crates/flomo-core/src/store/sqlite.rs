//! `SQLite` block store implementation
//!
//! Children are ordered by a per-parent `position` column; inserting a first
//! child takes `MIN(position) - 1`, a last child `MAX(position) + 1`. Grouped
//! batches map to a plain `BEGIN IMMEDIATE` / `COMMIT` / `ROLLBACK`.
//! There is no local cache: `cached_block` always misses.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{html_to_paragraphs, new_asset_ref, BlockStore, TagQuery};
use crate::error::{Error, Result};
use crate::models::{
    AssetRef, Block, BlockContent, BlockId, InsertPosition, Property, TagRef, Timestamps,
};
use crate::util::unix_millis_now;

const JOURNAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// `SQLite` implementation of `BlockStore`
pub struct SqliteBlockStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteBlockStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the day-root block for `date`, or return the existing one
    pub fn create_journal_block(&self, date: NaiveDate) -> Result<BlockId> {
        let key = date.format(JOURNAL_DATE_FORMAT).to_string();
        if let Some(id) = self.journal_id(&key)? {
            return Ok(id);
        }

        let now = unix_millis_now();
        self.conn.execute(
            "INSERT INTO blocks (parent_id, position, kind, content, journal_date, created_at, updated_at)
             VALUES (NULL, 0, 'text', ?, ?, ?, ?)",
            params![key, key, now, now],
        )?;
        Ok(BlockId(self.conn.last_insert_rowid()))
    }

    /// Media type and payload of an uploaded asset
    pub fn asset(&self, asset: &AssetRef) -> Result<Option<(String, Vec<u8>)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT media_type, data FROM assets WHERE id = ?",
                [asset.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }

    fn journal_id(&self, key: &str) -> Result<Option<BlockId>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM blocks WHERE journal_date = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?
            .map(BlockId))
    }

    fn load_block(&self, id: BlockId) -> Result<Option<Block>> {
        let row = self
            .conn
            .query_row(
                "SELECT parent_id, kind, content, created_at, updated_at FROM blocks WHERE id = ?",
                [id.0],
                |row| {
                    Ok((
                        row.get::<_, Option<i64>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((parent, kind, value, created, modified)) = row else {
            return Ok(None);
        };

        Ok(Some(Block {
            id,
            parent: parent.map(BlockId),
            content: BlockContent::from_parts(&kind, value)?,
            children: self.children_of(id)?,
            properties: self.properties_of(id)?,
            tags: self.tags_of(id)?,
            created: from_millis(created),
            modified: from_millis(modified),
        }))
    }

    fn children_of(&self, id: BlockId) -> Result<Vec<BlockId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM blocks WHERE parent_id = ? ORDER BY position, id")?;
        let children = stmt
            .query_map([id.0], |row| row.get(0).map(BlockId))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(children)
    }

    fn properties_of(&self, id: BlockId) -> Result<Vec<Property>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, kind, value FROM block_properties WHERE block_id = ? ORDER BY position",
        )?;
        let rows = stmt
            .query_map([id.0], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(name, kind, value)| {
                Ok(Property {
                    name,
                    kind: kind.parse()?,
                    value,
                })
            })
            .collect()
    }

    fn tags_of(&self, id: BlockId) -> Result<Vec<TagRef>> {
        let mut stmt = self.conn.prepare(
            "SELECT bt.tag_id, t.content FROM block_tags bt
             JOIN blocks t ON t.id = bt.tag_id
             WHERE bt.block_id = ? ORDER BY bt.position",
        )?;
        let refs = stmt
            .query_map([id.0], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut tags = Vec::with_capacity(refs.len());
        for (tag_id, name) in refs {
            let mut stmt = self.conn.prepare(
                "SELECT name, kind, value FROM tag_values
                 WHERE block_id = ? AND tag_id = ? ORDER BY position",
            )?;
            let data = stmt
                .query_map(params![id.0, tag_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?
                .into_iter()
                .map(|(name, kind, value)| {
                    Ok(Property {
                        name,
                        kind: kind.parse()?,
                        value,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            tags.push(TagRef {
                tag: BlockId(tag_id),
                name,
                data,
            });
        }
        Ok(tags)
    }

    fn ensure_exists(&self, id: BlockId) -> Result<()> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM blocks WHERE id = ?)",
            [id.0],
            |row| row.get(0),
        )?;
        if exists {
            Ok(())
        } else {
            Err(Error::NotFound(format!("block {id}")))
        }
    }

    fn next_position(&self, parent: BlockId, position: InsertPosition) -> Result<i64> {
        let sql = match position {
            InsertPosition::FirstChild => {
                "SELECT COALESCE(MIN(position), 1) - 1 FROM blocks WHERE parent_id = ?"
            }
            InsertPosition::LastChild => {
                "SELECT COALESCE(MAX(position), -1) + 1 FROM blocks WHERE parent_id = ?"
            }
        };
        Ok(self.conn.query_row(sql, [parent.0], |row| row.get(0))?)
    }

    fn insert_row(
        &self,
        parent: BlockId,
        position: i64,
        content: &BlockContent,
        created: i64,
        modified: i64,
    ) -> Result<BlockId> {
        self.conn.execute(
            "INSERT INTO blocks (parent_id, position, kind, content, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                parent.0,
                position,
                content.kind(),
                content.value(),
                created,
                modified
            ],
        )?;
        Ok(BlockId(self.conn.last_insert_rowid()))
    }

    fn tag_block(&self, name: &str) -> Result<BlockId> {
        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM blocks WHERE alias = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        if let Some(id) = existing {
            return Ok(BlockId(id));
        }

        let now = unix_millis_now();
        self.conn.execute(
            "INSERT INTO blocks (parent_id, position, kind, content, alias, created_at, updated_at)
             VALUES (NULL, 0, 'text', ?, ?, ?, ?)",
            params![name, name, now, now],
        )?;
        Ok(BlockId(self.conn.last_insert_rowid()))
    }

    fn touch(&self, id: BlockId) -> Result<()> {
        self.conn.execute(
            "UPDATE blocks SET updated_at = ? WHERE id = ?",
            params![unix_millis_now(), id.0],
        )?;
        Ok(())
    }
}

fn from_millis(value: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value).unwrap_or_default()
}

impl BlockStore for SqliteBlockStore<'_> {
    fn cached_block(&self, _id: BlockId) -> Option<Block> {
        None
    }

    async fn get_block(&self, id: BlockId) -> Result<Option<Block>> {
        self.load_block(id)
    }

    async fn get_blocks(&self, ids: &[BlockId]) -> Result<Vec<Block>> {
        let mut blocks = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(block) = self.load_block(*id)? {
                blocks.push(block);
            }
        }
        Ok(blocks)
    }

    async fn insert_block(
        &self,
        parent: BlockId,
        position: InsertPosition,
        content: BlockContent,
        timestamps: Option<Timestamps>,
    ) -> Result<BlockId> {
        self.ensure_exists(parent)?;
        let now = unix_millis_now();
        let (created, modified) = timestamps.map_or((now, now), |t| {
            (t.created.timestamp_millis(), t.modified.timestamp_millis())
        });
        let slot = self.next_position(parent, position)?;
        self.insert_row(parent, slot, &content, created, modified)
    }

    async fn insert_html(
        &self,
        parent: BlockId,
        position: InsertPosition,
        html: &str,
    ) -> Result<Vec<BlockId>> {
        self.ensure_exists(parent)?;
        let paragraphs = html_to_paragraphs(html);
        let count = i64::try_from(paragraphs.len())
            .map_err(|_| Error::InvalidInput("rich text has too many paragraphs".to_string()))?;

        // Reserve a contiguous run of positions so the paragraphs keep document order.
        let start = match position {
            InsertPosition::FirstChild => self.next_position(parent, position)? - count + 1,
            InsertPosition::LastChild => self.next_position(parent, position)?,
        };

        let now = unix_millis_now();
        let mut ids = Vec::with_capacity(paragraphs.len());
        for (offset, paragraph) in (0_i64..).zip(paragraphs) {
            let content = BlockContent::text(paragraph);
            ids.push(self.insert_row(parent, start + offset, &content, now, now)?);
        }
        Ok(ids)
    }

    async fn delete_blocks(&self, ids: &[BlockId]) -> Result<()> {
        for id in ids {
            self.conn.execute("DELETE FROM blocks WHERE id = ?", [id.0])?;
        }
        Ok(())
    }

    async fn set_properties(&self, ids: &[BlockId], properties: &[Property]) -> Result<()> {
        for id in ids {
            self.ensure_exists(*id)?;
            for property in properties {
                self.conn.execute(
                    "INSERT INTO block_properties (block_id, name, kind, value, position)
                     VALUES (?1, ?2, ?3, ?4,
                        (SELECT COALESCE(MAX(position), -1) + 1 FROM block_properties WHERE block_id = ?1))
                     ON CONFLICT(block_id, name) DO UPDATE SET kind = excluded.kind, value = excluded.value",
                    params![id.0, property.name, property.kind.as_str(), property.value],
                )?;
            }
            self.touch(*id)?;
        }
        Ok(())
    }

    async fn clear_tags(&self, ids: &[BlockId]) -> Result<()> {
        for id in ids {
            self.ensure_exists(*id)?;
            self.conn
                .execute("DELETE FROM block_tags WHERE block_id = ?", [id.0])?;
            self.touch(*id)?;
        }
        Ok(())
    }

    async fn insert_tag(
        &self,
        block: BlockId,
        tag: &str,
        properties: &[Property],
    ) -> Result<BlockId> {
        self.ensure_exists(block)?;
        let tag_id = self.tag_block(tag)?;

        self.conn.execute(
            "INSERT OR IGNORE INTO block_tags (block_id, tag_id, position)
             VALUES (?1, ?2,
                (SELECT COALESCE(MAX(position), -1) + 1 FROM block_tags WHERE block_id = ?1))",
            params![block.0, tag_id.0],
        )?;
        for property in properties {
            self.conn.execute(
                "INSERT INTO tag_values (block_id, tag_id, name, kind, value, position)
                 VALUES (?1, ?2, ?3, ?4, ?5,
                    (SELECT COALESCE(MAX(position), -1) + 1 FROM tag_values
                     WHERE block_id = ?1 AND tag_id = ?2))
                 ON CONFLICT(block_id, tag_id, name) DO UPDATE SET kind = excluded.kind, value = excluded.value",
                params![
                    block.0,
                    tag_id.0,
                    property.name,
                    property.kind.as_str(),
                    property.value
                ],
            )?;
        }
        self.touch(block)?;
        Ok(tag_id)
    }

    async fn query(&self, query: &TagQuery) -> Result<Vec<BlockId>> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT v.block_id FROM tag_values v
             JOIN blocks t ON t.id = v.tag_id
             WHERE t.alias = ? AND v.name = ? AND v.value = ?
             ORDER BY v.block_id
             LIMIT ?",
        )?;
        let ids = stmt
            .query_map(
                params![query.tag, query.property, query.value, limit],
                |row| row.get(0).map(BlockId),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    async fn get_journal_block(&self, date: NaiveDate) -> Result<Option<Block>> {
        match self.journal_id(&date.format(JOURNAL_DATE_FORMAT).to_string())? {
            Some(id) => self.load_block(id),
            None => Ok(None),
        }
    }

    async fn begin_group(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    async fn commit_group(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    async fn rollback_group(&self) -> Result<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    async fn upload_binary(&self, media_type: &str, bytes: &[u8]) -> Result<AssetRef> {
        let asset = new_asset_ref(media_type);
        self.conn.execute(
            "INSERT INTO assets (id, media_type, data, created_at) VALUES (?, ?, ?, ?)",
            params![asset.as_str(), media_type, bytes, unix_millis_now()],
        )?;
        Ok(asset)
    }
}
