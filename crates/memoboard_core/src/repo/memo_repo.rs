//! Memo backend contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped select/insert/update/delete over the `memos` table.
//! - Publish a change event for every committed write.
//!
//! # Invariants
//! - The backend owns `created_at`/`updated_at`; client values are replaced.
//! - `updated_at` strictly increases on every write of one row.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::model::memo::{
    Memo, MemoId, MemoPatch, MemoValidationError, OwnerId, PositionUpdate,
};
use crate::repo::change_feed::{ChangeEvent, ChangeFeed, ChangeSubscription};
use crate::repo::{ensure_table_ready, parse_uuid, server_now_ms, RepoError, RepoResult};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};

const MEMO_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    content,
    color,
    position,
    created_at,
    updated_at,
    is_deleted
FROM memos";

const MEMO_COLUMNS: &[&str] = &[
    "id",
    "user_id",
    "title",
    "content",
    "color",
    "position",
    "created_at",
    "updated_at",
    "is_deleted",
];

/// Backend contract for the memos collection.
pub trait MemoRepository {
    /// Lists every memo of `owner`, active and trashed, by position ascending.
    fn fetch_memos(&self, owner: OwnerId) -> RepoResult<Vec<Memo>>;
    /// Loads one memo.
    fn get_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<Option<Memo>>;
    /// Inserts a client-identified memo and returns the stored record.
    fn insert_memo(&self, memo: &Memo) -> RepoResult<Memo>;
    /// Applies a partial update and returns the stored record.
    fn update_memo(&self, owner: OwnerId, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo>;
    /// Permanently removes one memo.
    fn delete_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<()>;
    /// Writes several positions atomically.
    fn update_positions(&self, owner: OwnerId, updates: &[PositionUpdate]) -> RepoResult<()>;
    /// Opens a realtime subscription for `owner`'s changes.
    fn subscribe(&self, owner: OwnerId) -> ChangeSubscription;
}

/// SQLite-backed memo repository.
pub struct SqliteMemoRepository<'conn> {
    conn: &'conn Connection,
    feed: ChangeFeed,
}

impl<'conn> SqliteMemoRepository<'conn> {
    /// Constructs a repository with its own change feed.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Self::with_feed(conn, ChangeFeed::default())
    }

    /// Constructs a repository publishing into a shared feed.
    ///
    /// Repositories sharing one feed behave like several clients of the same
    /// backend: each sees the others' writes as realtime events.
    pub fn with_feed(conn: &'conn Connection, feed: ChangeFeed) -> RepoResult<Self> {
        ensure_table_ready(conn, "memos", MEMO_COLUMNS)?;
        Ok(Self { conn, feed })
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    fn load(&self, owner: OwnerId, id: MemoId) -> RepoResult<Memo> {
        self.get_memo(owner, id)?.ok_or(RepoError::NotFound(id))
    }
}

impl MemoRepository for SqliteMemoRepository<'_> {
    fn fetch_memos(&self, owner: OwnerId) -> RepoResult<Vec<Memo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMO_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY position ASC, created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut memos = Vec::new();
        while let Some(row) = rows.next()? {
            memos.push(parse_memo_row(row)?);
        }
        Ok(memos)
    }

    fn get_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<Option<Memo>> {
        let mut stmt = self.conn.prepare(&format!(
            "{MEMO_SELECT_SQL}
             WHERE id = ?1
               AND user_id = ?2;"
        ))?;
        let mut rows = stmt.query(params![id.to_string(), owner.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_memo_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert_memo(&self, memo: &Memo) -> RepoResult<Memo> {
        memo.validate()?;
        let now = server_now_ms();

        self.conn.execute(
            "INSERT INTO memos (
                id,
                user_id,
                title,
                content,
                color,
                position,
                created_at,
                updated_at,
                is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8);",
            params![
                memo.id.to_string(),
                memo.owner.to_string(),
                memo.title.as_str(),
                memo.content.as_str(),
                memo.color.hex(),
                memo.position,
                now,
                memo.is_deleted,
            ],
        )?;

        let stored = self.load(memo.owner, memo.id)?;
        self.feed.publish(ChangeEvent::Insert(stored.clone()));
        Ok(stored)
    }

    fn update_memo(&self, owner: OwnerId, id: MemoId, patch: &MemoPatch) -> RepoResult<Memo> {
        let mut memo = self.load(owner, id)?;
        if patch.is_empty() {
            return Ok(memo);
        }
        memo.apply_patch(patch);
        memo.validate()?;

        let changed = self.conn.execute(
            "UPDATE memos
             SET
                title = ?3,
                content = ?4,
                color = ?5,
                position = ?6,
                is_deleted = ?7,
                updated_at = MAX(?8, updated_at + 1)
             WHERE id = ?1
               AND user_id = ?2;",
            params![
                id.to_string(),
                owner.to_string(),
                memo.title.as_str(),
                memo.content.as_str(),
                memo.color.hex(),
                memo.position,
                memo.is_deleted,
                server_now_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let stored = self.load(owner, id)?;
        self.feed.publish(ChangeEvent::Update(stored.clone()));
        Ok(stored)
    }

    fn delete_memo(&self, owner: OwnerId, id: MemoId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM memos WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), owner.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        self.feed.publish(ChangeEvent::Delete { id, owner });
        Ok(())
    }

    fn update_positions(&self, owner: OwnerId, updates: &[PositionUpdate]) -> RepoResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        let now = server_now_ms();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        for update in updates {
            if update.position < 0 {
                return Err(MemoValidationError::NegativePosition(update.position).into());
            }
            let changed = tx.execute(
                "UPDATE memos
                 SET position = ?3,
                     updated_at = MAX(?4, updated_at + 1)
                 WHERE id = ?1
                   AND user_id = ?2;",
                params![
                    update.id.to_string(),
                    owner.to_string(),
                    update.position,
                    now
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(update.id));
            }
        }
        tx.commit()?;

        for update in updates {
            let stored = self.load(owner, update.id)?;
            self.feed.publish(ChangeEvent::Update(stored));
        }
        Ok(())
    }

    fn subscribe(&self, owner: OwnerId) -> ChangeSubscription {
        self.feed.subscribe(owner)
    }
}

fn parse_memo_row(row: &Row<'_>) -> RepoResult<Memo> {
    let id_text: String = row.get("id")?;
    let owner_text: String = row.get("user_id")?;
    let color_text: String = row.get("color")?;

    let is_deleted = match row.get::<_, i64>("is_deleted")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_deleted value `{other}` in memos.is_deleted"
            )));
        }
    };

    Ok(Memo {
        id: parse_uuid(&id_text, "memos.id")?,
        owner: parse_uuid(&owner_text, "memos.user_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        color: color_text.into(),
        position: row.get("position")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        is_deleted,
    })
}
