//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist tasks under their parent list (`lists/{listId}/tasks/{taskId}`).
//!
//! # Invariants
//! - Every query is scoped by `list_uuid`; a task id is never resolved
//!   outside its list.
//! - Task writes bump the parent list's `updated_at` in the same transaction.
//! - Deleting a missing task reports `NotFound`; deletes are not idempotent.

use super::list_repo::{ensure_changed, touch_list};
use super::{
    bool_to_int, ensure_tables, parse_flag, parse_uuid, RepoError, RepoResult, STORE_NOW_MS,
};
use crate::model::list::ListId;
use crate::model::task::{Task, TaskId, TaskPatch};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    list_uuid,
    name,
    description,
    due_date,
    completed,
    created_at,
    updated_at
FROM tasks";

/// Repository interface for task documents.
pub trait TaskRepository {
    /// Creates a task with defaults (`completed=false`, empty description,
    /// no date) under an existing list.
    fn insert_task(&self, list_id: ListId, name: &str) -> RepoResult<Task>;
    fn get_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists a list's tasks in creation order.
    fn tasks_in_list(&self, list_id: ListId) -> RepoResult<Vec<Task>>;
    fn update_task(&self, list_id: ListId, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()>;
    fn delete_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_tables(conn, &["lists", "tasks"])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_task(&self, list_id: ListId, name: &str) -> RepoResult<Task> {
        let id = Uuid::new_v4();

        let tx = self.conn.unchecked_transaction()?;
        touch_list(&tx, list_id)?;
        tx.execute(
            &format!(
                "INSERT INTO tasks (
                    uuid,
                    list_uuid,
                    name,
                    description,
                    due_date,
                    completed,
                    created_at,
                    updated_at
                ) VALUES (?1, ?2, ?3, '', NULL, 0, {STORE_NOW_MS}, {STORE_NOW_MS});"
            ),
            params![id.to_string(), list_id.to_string(), name],
        )?;
        tx.commit()?;

        self.get_task(list_id, id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("task `{id}` missing after insert read-back"))
        })
    }

    fn get_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("{TASK_SELECT_SQL} WHERE list_uuid = ?1 AND uuid = ?2;"),
                params![list_id.to_string(), task_id.to_string()],
                read_task_row,
            )
            .optional()?;

        task.map(RawTaskRow::into_task).transpose()
    }

    fn tasks_in_list(&self, list_id: ListId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE list_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([list_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(read_task_row(row)?.into_task()?);
        }
        Ok(tasks)
    }

    fn update_task(&self, list_id: ListId, task_id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
        let mut assignments = vec![format!("updated_at = MAX(updated_at, {STORE_NOW_MS})")];
        let mut bind_values: Vec<Value> = vec![
            Value::Text(list_id.to_string()),
            Value::Text(task_id.to_string()),
        ];

        if let Some(name) = patch.name.as_ref() {
            bind_values.push(Value::Text(name.clone()));
            assignments.push(format!("name = ?{}", bind_values.len()));
        }
        if let Some(description) = patch.description.as_ref() {
            bind_values.push(Value::Text(description.clone()));
            assignments.push(format!("description = ?{}", bind_values.len()));
        }
        if let Some(date) = patch.date {
            bind_values.push(date.map_or(Value::Null, Value::Integer));
            assignments.push(format!("due_date = ?{}", bind_values.len()));
        }
        if let Some(completed) = patch.completed {
            bind_values.push(Value::Integer(bool_to_int(completed)));
            assignments.push(format!("completed = ?{}", bind_values.len()));
        }

        let sql = format!(
            "UPDATE tasks SET {} WHERE list_uuid = ?1 AND uuid = ?2;",
            assignments.join(", ")
        );

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        ensure_changed(changed, task_id)?;
        touch_list(&tx, list_id)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_task(&self, list_id: ListId, task_id: TaskId) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "DELETE FROM tasks WHERE list_uuid = ?1 AND uuid = ?2;",
            params![list_id.to_string(), task_id.to_string()],
        )?;
        ensure_changed(changed, task_id)?;
        touch_list(&tx, list_id)?;
        tx.commit()?;
        Ok(())
    }
}

struct RawTaskRow {
    uuid: String,
    list_uuid: String,
    name: String,
    description: String,
    due_date: Option<i64>,
    completed: i64,
    created_at: i64,
    updated_at: i64,
}

impl RawTaskRow {
    fn into_task(self) -> RepoResult<Task> {
        let task = Task {
            id: parse_uuid(&self.uuid, "tasks.uuid")?,
            list_id: parse_uuid(&self.list_uuid, "tasks.list_uuid")?,
            name: self.name,
            description: self.description,
            date: self.due_date,
            completed: parse_flag(self.completed, "tasks.completed")?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        task.validate()
            .map_err(|err| RepoError::InvalidData(format!("task `{}`: {err}", task.id)))?;
        Ok(task)
    }
}

fn read_task_row(row: &Row<'_>) -> rusqlite::Result<RawTaskRow> {
    Ok(RawTaskRow {
        uuid: row.get("uuid")?,
        list_uuid: row.get("list_uuid")?,
        name: row.get("name")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        completed: row.get("completed")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
