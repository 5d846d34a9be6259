//! Dashboard view model.
//!
//! # Responsibility
//! - Resolve the caller from the injected `SessionContext` for every call.
//! - Keep the list directory and task selection aligned with that caller.
//! - Record the last user-displayable failure.
//!
//! # Invariants
//! - Local caches change only after the store confirmed a write.
//! - Every operation first aligns the caches with the identity in the
//!   context; an identity change drops the selection before lists are
//!   re-fetched.
//! - Read accessors expose nothing cached for a different identity.
//! - Deleting the active list clears the selection.

pub mod collection;
pub mod directory;
pub mod selection;

use crate::model::identity::IdentityId;
use crate::model::list::{ListId, TaskList};
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::list_repo::ListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::task_store::{StoreResult, TaskStore};
use crate::session::context::SessionContext;
use collection::TaskCollection;
use directory::ListDirectory;
use once_cell::sync::Lazy;
use selection::{FetchOutcome, SelectionController};

static NO_TASKS: Lazy<TaskCollection> = Lazy::new(TaskCollection::default);

/// Lists plus active-list tasks for the signed-in identity.
#[derive(Debug, Clone)]
pub struct Dashboard {
    context: SessionContext,
    directory: ListDirectory,
    selection: SelectionController,
    last_error: Option<String>,
}

impl Dashboard {
    pub fn new(context: SessionContext) -> Self {
        Self {
            context,
            directory: ListDirectory::new(),
            selection: SelectionController::new(),
            last_error: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn directory(&self) -> &ListDirectory {
        &self.directory
    }

    /// Cached lists, or nothing while the cache belongs to another identity.
    pub fn lists(&self) -> &[TaskList] {
        if self.is_aligned() {
            self.directory.lists()
        } else {
            &[]
        }
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn active_list_id(&self) -> Option<ListId> {
        self.selection
            .active_list_id()
            .filter(|_| self.is_aligned())
    }

    pub fn active_list(&self) -> Option<&TaskList> {
        self.active_list_id()
            .and_then(|list_id| self.directory.get(list_id))
    }

    /// Active-list tasks, or an empty collection while stale.
    pub fn tasks(&self) -> &TaskCollection {
        if self.is_aligned() {
            self.selection.tasks()
        } else {
            &NO_TASKS
        }
    }

    /// Message of the most recent failed operation.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn caller(&self) -> Option<IdentityId> {
        self.context.uid()
    }

    fn is_aligned(&self) -> bool {
        self.directory.owner().cloned() == self.caller()
    }

    /// Re-aligns caches with the current identity.
    pub fn sync_session<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
    ) -> StoreResult<()> {
        let result = self.align(store);
        self.record(result)
    }

    /// Unconditionally re-fetches the visible lists.
    pub fn refresh_lists<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
    ) -> StoreResult<()> {
        let caller = self.caller();
        let result = self
            .align(store)
            .and_then(|()| self.directory.refresh(store, caller.as_ref()));
        self.record(result)
    }

    pub fn add_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        name: &str,
    ) -> StoreResult<TaskList> {
        let caller = self.caller();
        let result = self
            .align(store)
            .and_then(|()| self.directory.create_list(store, caller.as_ref(), name));
        self.record(result)
    }

    pub fn rename_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        list_id: ListId,
        name: &str,
    ) -> StoreResult<TaskList> {
        let caller = self.caller();
        let result = self.align(store).and_then(|()| {
            self.directory
                .rename_list(store, caller.as_ref(), list_id, name)
        });
        self.record(result)
    }

    pub fn set_favorite<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        list_id: ListId,
        favorite: bool,
    ) -> StoreResult<TaskList> {
        let caller = self.caller();
        let result = self.align(store).and_then(|()| {
            self.directory
                .set_favorite(store, caller.as_ref(), list_id, favorite)
        });
        self.record(result)
    }

    pub fn delete_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        list_id: ListId,
    ) -> StoreResult<()> {
        let caller = self.caller();
        let result = self
            .align(store)
            .and_then(|()| self.directory.delete_list(store, caller.as_ref(), list_id));
        if result.is_ok() && self.selection.active_list_id() == Some(list_id) {
            self.selection.select(None);
        }
        self.record(result)
    }

    /// Selects a list (or clears with `None`) and loads its tasks.
    pub fn select_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        list_id: Option<ListId>,
    ) -> StoreResult<FetchOutcome> {
        let caller = self.caller();
        let result = self.align(store).and_then(|()| {
            self.selection
                .select_and_load(store, caller.as_ref(), list_id)
        });
        self.record(result)
    }

    pub fn add_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        name: &str,
    ) -> StoreResult<Task> {
        let caller = self.caller();
        let result = self
            .align(store)
            .and_then(|()| self.selection.add_task(store, caller.as_ref(), name));
        self.record(result)
    }

    pub fn update_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<Task> {
        let caller = self.caller();
        let result = self.align(store).and_then(|()| {
            self.selection
                .update_task(store, caller.as_ref(), task_id, patch)
        });
        self.record(result)
    }

    pub fn toggle_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        task_id: TaskId,
    ) -> StoreResult<Task> {
        let caller = self.caller();
        let result = self.align(store).and_then(|()| {
            self.selection
                .toggle_completed(store, caller.as_ref(), task_id)
        });
        self.record(result)
    }

    pub fn delete_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        task_id: TaskId,
    ) -> StoreResult<()> {
        let caller = self.caller();
        let result = self
            .align(store)
            .and_then(|()| self.selection.delete_task(store, caller.as_ref(), task_id));
        self.record(result)
    }

    /// Drops in-flight fetches when the view goes away.
    pub fn teardown(&mut self) {
        self.selection.cancel_pending();
    }

    /// Drops the selection and re-fetches lists when the context identity no
    /// longer matches the cache.
    fn align<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
    ) -> StoreResult<()> {
        if self.is_aligned() {
            return Ok(());
        }
        self.selection.select(None);
        self.directory
            .sync_identity(store, &self.context)
            .map(|_| ())
    }

    fn record<R>(&mut self, result: StoreResult<R>) -> StoreResult<R> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(err) => self.last_error = Some(err.to_string()),
        }
        result
    }
}
