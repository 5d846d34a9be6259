//! Access-controlled list/task store.
//!
//! # Responsibility
//! - Be the only writer of persisted list/task state.
//! - Gate every read and write on the caller's membership.
//! - Validate user input before it reaches the repositories.
//!
//! # Invariants
//! - A missing or blank caller fails with `Unauthorized`.
//! - List lookups resolve existence before membership, so an unknown list id
//!   reports `ListNotFound` and a foreign one reports `Unauthorized`.
//! - Ownership-only operations (delete list, manage members) reject other
//!   members with `Unauthorized`.
//! - `delete_task` is not idempotent: deleting an already deleted id fails
//!   with `TaskNotFound`.
//! - No operation is retried.

use crate::error::ErrorKind;
use crate::model::identity::IdentityId;
use crate::model::list::{ListId, TaskList};
use crate::model::normalize_name;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::list_repo::{ListRepository, SqliteListRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{RepoError, RepoResult};
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by access-controlled store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Caller is absent or lacks the membership/ownership required.
    Unauthorized,
    /// List id does not exist.
    ListNotFound(ListId),
    /// Task id does not exist inside the given list.
    TaskNotFound { list_id: ListId, task_id: TaskId },
    /// Input rejected before any write.
    InvalidArgument(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::ListNotFound(_) | Self::TaskNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "you do not have access to this list"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::TaskNotFound { task_id, .. } => write!(f, "task not found: {task_id}"),
            Self::InvalidArgument(message) => write!(f, "invalid input: {message}"),
            Self::Repo(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidArgument(err.to_string()),
            other => Self::Repo(other),
        }
    }
}

/// Store wired to the SQLite repositories of one connection.
pub type SqliteTaskStore<'conn> =
    TaskStore<SqliteListRepository<'conn>, SqliteTaskRepository<'conn>>;

/// Access-controlled facade over list and task repositories.
pub struct TaskStore<L: ListRepository, T: TaskRepository> {
    lists: L,
    tasks: T,
}

impl<'conn> TaskStore<SqliteListRepository<'conn>, SqliteTaskRepository<'conn>> {
    /// Builds a store over a migrated SQLite connection.
    pub fn sqlite(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteListRepository::try_new(conn)?,
            SqliteTaskRepository::try_new(conn)?,
        ))
    }
}

impl<L: ListRepository, T: TaskRepository> TaskStore<L, T> {
    pub fn new(lists: L, tasks: T) -> Self {
        Self { lists, tasks }
    }

    /// Returns every list the caller is a member of.
    ///
    /// Callers must not rely on the returned order.
    pub fn list_all_visible(&self, caller: Option<&IdentityId>) -> StoreResult<Vec<TaskList>> {
        let started_at = Instant::now();
        let result = require_caller(caller)
            .and_then(|uid| self.lists.lists_for_member(uid).map_err(Into::into));
        if let Ok(lists) = result.as_ref() {
            info!(
                "event=lists_fetch module=store status=ok count={} duration_ms={}",
                lists.len(),
                started_at.elapsed().as_millis()
            );
        }
        log_failure("lists_fetch", result)
    }

    /// Creates a list owned by the caller.
    ///
    /// # Contract
    /// - `owner = caller`, `members = {caller}`, `favorite = false`.
    /// - `created_at == updated_at`, both taken from the store clock.
    pub fn create_list(&self, caller: Option<&IdentityId>, name: &str) -> StoreResult<TaskList> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            let name = validated_name(name)?;
            Ok(self.lists.insert_list(uid, &name)?)
        })();
        if let Ok(list) = result.as_ref() {
            info!("event=list_create module=store status=ok list_id={}", list.id);
        }
        log_failure("list_create", result)
    }

    /// Returns one list if the caller is a member.
    pub fn get_list(&self, list_id: ListId, caller: Option<&IdentityId>) -> StoreResult<TaskList> {
        let result = require_caller(caller).and_then(|uid| self.member_list(list_id, uid));
        log_failure("list_get", result)
    }

    /// Renames a list. Any member may rename.
    pub fn rename_list(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
        name: &str,
    ) -> StoreResult<TaskList> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            let name = validated_name(name)?;
            self.member_list(list_id, uid)?;
            self.lists
                .update_list_name(list_id, &name)
                .map_err(|err| not_found_as_list(err, list_id))?;
            self.reload_list(list_id)
        })();
        if result.is_ok() {
            info!("event=list_rename module=store status=ok list_id={list_id}");
        }
        log_failure("list_rename", result)
    }

    /// Marks or unmarks a list as favorite. Any member may toggle.
    pub fn set_list_favorite(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
        favorite: bool,
    ) -> StoreResult<TaskList> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            self.member_list(list_id, uid)?;
            self.lists
                .update_list_favorite(list_id, favorite)
                .map_err(|err| not_found_as_list(err, list_id))?;
            self.reload_list(list_id)
        })();
        if result.is_ok() {
            info!(
                "event=list_favorite module=store status=ok list_id={list_id} favorite={favorite}"
            );
        }
        log_failure("list_favorite", result)
    }

    /// Deletes a list and, through cascade, all of its tasks. Owner only.
    pub fn delete_list(&self, list_id: ListId, caller: Option<&IdentityId>) -> StoreResult<()> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            self.owned_list(list_id, uid)?;
            self.lists
                .delete_list(list_id)
                .map_err(|err| not_found_as_list(err, list_id))
        })();
        if result.is_ok() {
            info!("event=list_delete module=store status=ok list_id={list_id}");
        }
        log_failure("list_delete", result)
    }

    /// Grants `member` access to the list. Owner only.
    pub fn add_member(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
        member: &IdentityId,
    ) -> StoreResult<TaskList> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            if member.is_blank() {
                return Err(StoreError::InvalidArgument(
                    "member id must not be blank".to_string(),
                ));
            }
            self.owned_list(list_id, uid)?;
            self.lists
                .insert_member(list_id, member)
                .map_err(|err| not_found_as_list(err, list_id))?;
            self.reload_list(list_id)
        })();
        if let Ok(list) = result.as_ref() {
            info!(
                "event=member_add module=store status=ok list_id={list_id} member_count={}",
                list.members.len()
            );
        }
        log_failure("member_add", result)
    }

    /// Revokes `member`'s access. Owner only; the owner cannot be removed.
    pub fn remove_member(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
        member: &IdentityId,
    ) -> StoreResult<TaskList> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            let list = self.owned_list(list_id, uid)?;
            if list.is_owner(member) {
                return Err(StoreError::InvalidArgument(
                    "the list owner cannot be removed from members".to_string(),
                ));
            }
            self.lists
                .delete_member(list_id, member)
                .map_err(|err| not_found_as_list(err, list_id))?;
            self.reload_list(list_id)
        })();
        if let Ok(list) = result.as_ref() {
            info!(
                "event=member_remove module=store status=ok list_id={list_id} member_count={}",
                list.members.len()
            );
        }
        log_failure("member_remove", result)
    }

    /// Returns the tasks of a list the caller is a member of.
    ///
    /// # Errors
    /// - `ListNotFound` when the list does not exist.
    /// - `Unauthorized` when the caller is not a member.
    pub fn list_tasks(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
    ) -> StoreResult<Vec<Task>> {
        let started_at = Instant::now();
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            self.member_list(list_id, uid)?;
            Ok(self.tasks.tasks_in_list(list_id)?)
        })();
        if let Ok(tasks) = result.as_ref() {
            info!(
                "event=tasks_fetch module=store status=ok list_id={list_id} count={} duration_ms={}",
                tasks.len(),
                started_at.elapsed().as_millis()
            );
        }
        log_failure("tasks_fetch", result)
    }

    /// Creates a task with default fields in a list the caller belongs to.
    pub fn create_task(
        &self,
        list_id: ListId,
        caller: Option<&IdentityId>,
        name: &str,
    ) -> StoreResult<Task> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            let name = validated_name(name)?;
            self.member_list(list_id, uid)?;
            self.tasks
                .insert_task(list_id, &name)
                .map_err(|err| not_found_as_list(err, list_id))
        })();
        if let Ok(task) = result.as_ref() {
            info!(
                "event=task_create module=store status=ok list_id={list_id} task_id={}",
                task.id
            );
        }
        log_failure("task_create", result)
    }

    /// Applies a partial update to one task. Any member may update.
    pub fn update_task(
        &self,
        list_id: ListId,
        task_id: TaskId,
        caller: Option<&IdentityId>,
        patch: &TaskPatch,
    ) -> StoreResult<Task> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            let patch = patch
                .normalized()
                .map_err(|err| StoreError::InvalidArgument(err.to_string()))?;
            self.member_list(list_id, uid)?;
            if !patch.is_empty() {
                self.tasks
                    .update_task(list_id, task_id, &patch)
                    .map_err(|err| not_found_as_task(err, list_id, task_id))?;
            }
            self.tasks
                .get_task(list_id, task_id)?
                .ok_or(StoreError::TaskNotFound { list_id, task_id })
        })();
        if result.is_ok() {
            info!("event=task_update module=store status=ok list_id={list_id} task_id={task_id}");
        }
        log_failure("task_update", result)
    }

    /// Deletes one task.
    ///
    /// Not idempotent: a second delete of the same id fails with
    /// `TaskNotFound`.
    pub fn delete_task(
        &self,
        list_id: ListId,
        task_id: TaskId,
        caller: Option<&IdentityId>,
    ) -> StoreResult<()> {
        let result = (|| -> StoreResult<_> {
            let uid = require_caller(caller)?;
            self.member_list(list_id, uid)?;
            self.tasks
                .delete_task(list_id, task_id)
                .map_err(|err| not_found_as_task(err, list_id, task_id))
        })();
        if result.is_ok() {
            info!("event=task_delete module=store status=ok list_id={list_id} task_id={task_id}");
        }
        log_failure("task_delete", result)
    }

    fn member_list(&self, list_id: ListId, uid: &IdentityId) -> StoreResult<TaskList> {
        let list = self
            .lists
            .get_list(list_id)?
            .ok_or(StoreError::ListNotFound(list_id))?;
        if !list.is_member(uid) {
            return Err(StoreError::Unauthorized);
        }
        Ok(list)
    }

    fn owned_list(&self, list_id: ListId, uid: &IdentityId) -> StoreResult<TaskList> {
        let list = self.member_list(list_id, uid)?;
        if !list.is_owner(uid) {
            return Err(StoreError::Unauthorized);
        }
        Ok(list)
    }

    fn reload_list(&self, list_id: ListId) -> StoreResult<TaskList> {
        self.lists
            .get_list(list_id)?
            .ok_or(StoreError::ListNotFound(list_id))
    }
}

fn require_caller(caller: Option<&IdentityId>) -> StoreResult<&IdentityId> {
    match caller {
        Some(uid) if !uid.is_blank() => Ok(uid),
        _ => Err(StoreError::Unauthorized),
    }
}

fn validated_name(name: &str) -> StoreResult<String> {
    normalize_name(name).map_err(|err| StoreError::InvalidArgument(err.to_string()))
}

fn not_found_as_list(err: RepoError, list_id: ListId) -> StoreError {
    match err {
        RepoError::NotFound(_) => StoreError::ListNotFound(list_id),
        other => other.into(),
    }
}

fn not_found_as_task(err: RepoError, list_id: ListId, task_id: TaskId) -> StoreError {
    match err {
        RepoError::NotFound(id) if id == list_id => StoreError::ListNotFound(list_id),
        RepoError::NotFound(_) => StoreError::TaskNotFound { list_id, task_id },
        other => other.into(),
    }
}

fn log_failure<T>(event: &'static str, result: StoreResult<T>) -> StoreResult<T> {
    if let Err(err) = result.as_ref() {
        warn!(
            "event={event} module=store status=error error_code={}",
            err.kind().code()
        );
    }
    result
}
