//! List repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist list rows (`lists`) and their membership sets (`list_members`).
//! - Answer membership-filtered queries without loading foreign lists.
//!
//! # Invariants
//! - Creation writes the list row and the owner's membership in one
//!   transaction.
//! - Every mutation bumps `updated_at` monotonically.
//! - Deleting a list removes its members and tasks through FK cascade.

use super::{
    bool_to_int, ensure_tables, parse_flag, parse_uuid, RepoError, RepoResult, STORE_NOW_MS,
};
use crate::model::identity::IdentityId;
use crate::model::list::{ListId, TaskList};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use uuid::Uuid;

const LIST_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    owner_uid,
    favorite,
    created_at,
    updated_at
FROM lists";

/// Repository interface for list documents.
pub trait ListRepository {
    /// Creates a list owned by `owner` with a fresh id and `members = {owner}`.
    fn insert_list(&self, owner: &IdentityId, name: &str) -> RepoResult<TaskList>;
    fn get_list(&self, id: ListId) -> RepoResult<Option<TaskList>>;
    /// Returns every list whose members set contains `member`.
    fn lists_for_member(&self, member: &IdentityId) -> RepoResult<Vec<TaskList>>;
    fn update_list_name(&self, id: ListId, name: &str) -> RepoResult<()>;
    fn update_list_favorite(&self, id: ListId, favorite: bool) -> RepoResult<()>;
    /// Adds one member. Returns `false` when it was already present.
    fn insert_member(&self, id: ListId, member: &IdentityId) -> RepoResult<bool>;
    /// Removes one member. Returns `false` when it was not present.
    fn delete_member(&self, id: ListId, member: &IdentityId) -> RepoResult<bool>;
    fn delete_list(&self, id: ListId) -> RepoResult<()>;
}

/// SQLite-backed list repository.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `MissingRequiredTable` when migrations were not applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["lists", "list_members"])?;
        Ok(Self { conn })
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn insert_list(&self, owner: &IdentityId, name: &str) -> RepoResult<TaskList> {
        let id = Uuid::new_v4();
        let id_text = id.to_string();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!(
                "INSERT INTO lists (uuid, name, owner_uid, favorite, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 0, {STORE_NOW_MS}, {STORE_NOW_MS});"
            ),
            params![id_text, name, owner.as_str()],
        )?;
        tx.execute(
            "INSERT INTO list_members (list_uuid, member_uid) VALUES (?1, ?2);",
            params![id_text, owner.as_str()],
        )?;
        tx.commit()?;

        self.get_list(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("list `{id}` missing after insert read-back"))
        })
    }

    fn get_list(&self, id: ListId) -> RepoResult<Option<TaskList>> {
        let row = self
            .conn
            .query_row(
                &format!("{LIST_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                read_list_row,
            )
            .optional()?;

        match row {
            Some(raw) => Ok(Some(self.hydrate(raw)?)),
            None => Ok(None),
        }
    }

    fn lists_for_member(&self, member: &IdentityId) -> RepoResult<Vec<TaskList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1
                FROM list_members m
                WHERE m.list_uuid = lists.uuid
                  AND m.member_uid = ?1
             )
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let raw_rows = stmt
            .query_map([member.as_str()], read_list_row)?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows.into_iter().map(|raw| self.hydrate(raw)).collect()
    }

    fn update_list_name(&self, id: ListId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE lists
                 SET name = ?2, updated_at = MAX(updated_at, {STORE_NOW_MS})
                 WHERE uuid = ?1;"
            ),
            params![id.to_string(), name],
        )?;
        ensure_changed(changed, id)
    }

    fn update_list_favorite(&self, id: ListId, favorite: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE lists
                 SET favorite = ?2, updated_at = MAX(updated_at, {STORE_NOW_MS})
                 WHERE uuid = ?1;"
            ),
            params![id.to_string(), bool_to_int(favorite)],
        )?;
        ensure_changed(changed, id)
    }

    fn insert_member(&self, id: ListId, member: &IdentityId) -> RepoResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        touch_list(&tx, id)?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO list_members (list_uuid, member_uid) VALUES (?1, ?2);",
            params![id.to_string(), member.as_str()],
        )?;
        tx.commit()?;
        Ok(inserted == 1)
    }

    fn delete_member(&self, id: ListId, member: &IdentityId) -> RepoResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        touch_list(&tx, id)?;
        let removed = tx.execute(
            "DELETE FROM list_members WHERE list_uuid = ?1 AND member_uid = ?2;",
            params![id.to_string(), member.as_str()],
        )?;
        tx.commit()?;
        Ok(removed == 1)
    }

    fn delete_list(&self, id: ListId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM lists WHERE uuid = ?1;", [id.to_string()])?;
        ensure_changed(changed, id)
    }
}

impl SqliteListRepository<'_> {
    fn hydrate(&self, raw: RawListRow) -> RepoResult<TaskList> {
        let id = parse_uuid(&raw.uuid, "lists.uuid")?;
        let members = load_members(self.conn, &raw.uuid)?;
        let list = TaskList {
            id,
            name: raw.name,
            owner: IdentityId::new(raw.owner_uid),
            members,
            favorite: parse_flag(raw.favorite, "lists.favorite")?,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        };
        list.validate()
            .map_err(|err| RepoError::InvalidData(format!("list `{id}`: {err}")))?;
        Ok(list)
    }
}

struct RawListRow {
    uuid: String,
    name: String,
    owner_uid: String,
    favorite: i64,
    created_at: i64,
    updated_at: i64,
}

fn read_list_row(row: &Row<'_>) -> rusqlite::Result<RawListRow> {
    Ok(RawListRow {
        uuid: row.get("uuid")?,
        name: row.get("name")?,
        owner_uid: row.get("owner_uid")?,
        favorite: row.get("favorite")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_members(conn: &Connection, list_uuid: &str) -> RepoResult<BTreeSet<IdentityId>> {
    let mut stmt = conn.prepare(
        "SELECT member_uid
         FROM list_members
         WHERE list_uuid = ?1;",
    )?;
    let mut rows = stmt.query([list_uuid])?;
    let mut members = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let uid: String = row.get(0)?;
        members.insert(IdentityId::new(uid));
    }
    Ok(members)
}

pub(super) fn touch_list(conn: &Connection, id: ListId) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE lists
             SET updated_at = MAX(updated_at, {STORE_NOW_MS})
             WHERE uuid = ?1;"
        ),
        [id.to_string()],
    )?;
    ensure_changed(changed, id)
}

pub(super) fn ensure_changed(changed: usize, id: Uuid) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound(id));
    }
    Ok(())
}
