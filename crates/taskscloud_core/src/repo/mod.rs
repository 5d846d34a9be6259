//! Document-store adapter: raw persistence for lists and tasks.
//!
//! # Responsibility
//! - Provide collection-style CRUD over `lists/{listId}` and
//!   `lists/{listId}/tasks/{taskId}` backed by SQLite.
//! - Stamp ids and timestamps at write time using the store clock.
//!
//! # Invariants
//! - Repositories perform no authorization; callers go through
//!   `service::task_store::TaskStore`.
//! - Read paths validate persisted rows and report `InvalidData` instead of
//!   masking corruption.
//! - Deletes of missing rows report `NotFound`.

pub mod list_repo;
pub mod task_repo;

use crate::db::DbError;
use crate::model::ModelValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Store clock in epoch milliseconds.
///
/// SQLite evaluates `'now'` once per statement step, so every use inside one
/// statement yields the same value.
pub(crate) const STORE_NOW_MS: &str =
    "CAST(ROUND((julianday('now') - 2440587.5) * 86400000.0) AS INTEGER)";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for list/task persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "store is missing required table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn ensure_tables(conn: &Connection, tables: &[&'static str]) -> RepoResult<()> {
    for &table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn parse_flag(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
