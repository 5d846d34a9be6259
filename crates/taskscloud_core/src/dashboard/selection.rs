//! Active-list selection with stale-fetch protection.
//!
//! # Responsibility
//! - Track which list is active and own its `TaskCollection`.
//! - Hand out one `FetchTicket` per selection and apply only the newest one.
//! - Route task mutations through the store for the active list only.
//!
//! # Invariants
//! - Every `select` bumps the sequence; a ticket applies only while its
//!   sequence and list id are still current.
//! - Stale completions are dropped, failures included.
//! - The collection never holds tasks of more than one list.

use crate::dashboard::collection::TaskCollection;
use crate::model::identity::IdentityId;
use crate::model::list::ListId;
use crate::model::task::{Task, TaskId, TaskPatch};
use crate::repo::list_repo::ListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::task_store::{StoreError, StoreResult, TaskStore};
use log::debug;

/// Claim on one `list_tasks` fetch for a selection.
///
/// Tickets are `Copy + Send` so the fetch can run wherever a store is
/// available; the result is handed back through `SelectionController::complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    list_id: ListId,
    sequence: u64,
}

impl FetchTicket {
    pub fn list_id(&self) -> ListId {
        self.list_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Performs the single `list_tasks` call this ticket stands for.
    pub fn run<L: ListRepository, T: TaskRepository>(
        &self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
    ) -> StoreResult<Vec<Task>> {
        store.list_tasks(self.list_id, caller)
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Result replaced the collection.
    Applied { task_count: usize },
    /// A newer selection superseded the ticket.
    Discarded,
    /// Selection was cleared; nothing was fetched.
    Cleared,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionController {
    active: Option<ListId>,
    sequence: u64,
    collection: TaskCollection,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_list_id(&self) -> Option<ListId> {
        self.active
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.collection
    }

    /// Whether the collection holds the active list's tasks.
    pub fn is_loaded(&self) -> bool {
        self.active.is_some() && self.collection.list_id() == self.active
    }

    /// Switches the active list.
    ///
    /// Clears the collection and returns the ticket for the new list, or
    /// `None` when the selection was cleared. Re-selecting the active list
    /// issues a fresh ticket.
    pub fn select(&mut self, list_id: Option<ListId>) -> Option<FetchTicket> {
        self.sequence = self.sequence.wrapping_add(1);
        self.active = list_id;
        self.collection.clear();
        list_id.map(|list_id| FetchTicket {
            list_id,
            sequence: self.sequence,
        })
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.sequence == ticket.sequence && self.active == Some(ticket.list_id)
    }

    /// Applies a fetch result if `ticket` is still current.
    ///
    /// # Errors
    /// Returns the fetch error only for the current ticket; the collection
    /// stays empty in that case.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        result: StoreResult<Vec<Task>>,
    ) -> StoreResult<FetchOutcome> {
        if !self.is_current(&ticket) {
            debug!(
                "event=tasks_fetch module=dashboard status=discarded list_id={} sequence={}",
                ticket.list_id, ticket.sequence
            );
            return Ok(FetchOutcome::Discarded);
        }

        let tasks = result?;
        let task_count = tasks.len();
        self.collection.replace(ticket.list_id, tasks);
        Ok(FetchOutcome::Applied { task_count })
    }

    /// Selects `list_id` and runs its fetch inline.
    pub fn select_and_load<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        list_id: Option<ListId>,
    ) -> StoreResult<FetchOutcome> {
        match self.select(list_id) {
            Some(ticket) => {
                let result = ticket.run(store, caller);
                self.complete(ticket, result)
            }
            None => Ok(FetchOutcome::Cleared),
        }
    }

    /// Invalidates in-flight tickets without touching the selection.
    pub fn cancel_pending(&mut self) {
        self.sequence = self.sequence.wrapping_add(1);
    }

    /// Creates a task in the active list and appends it after the store
    /// confirms.
    pub fn add_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        name: &str,
    ) -> StoreResult<Task> {
        let list_id = self.loaded_list()?;
        let task = store.create_task(list_id, caller, name)?;
        self.collection.push(task.clone());
        Ok(task)
    }

    pub fn update_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        task_id: TaskId,
        patch: &TaskPatch,
    ) -> StoreResult<Task> {
        let list_id = self.loaded_list()?;
        let task = store.update_task(list_id, task_id, caller, patch)?;
        self.collection.upsert(task.clone());
        Ok(task)
    }

    /// Flips the completion flag of a cached task.
    pub fn toggle_completed<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        task_id: TaskId,
    ) -> StoreResult<Task> {
        let list_id = self.loaded_list()?;
        let completed = self
            .collection
            .get(task_id)
            .map(|task| task.completed)
            .ok_or(StoreError::TaskNotFound { list_id, task_id })?;
        let patch = TaskPatch {
            completed: Some(!completed),
            ..TaskPatch::default()
        };
        self.update_task(store, caller, task_id, &patch)
    }

    pub fn delete_task<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        task_id: TaskId,
    ) -> StoreResult<()> {
        let list_id = self.loaded_list()?;
        store.delete_task(list_id, task_id, caller)?;
        self.collection.remove(task_id);
        Ok(())
    }

    fn loaded_list(&self) -> StoreResult<ListId> {
        match self.active {
            Some(list_id) if self.is_loaded() => Ok(list_id),
            Some(_) => Err(StoreError::InvalidArgument(
                "tasks of the selected list are not loaded".to_string(),
            )),
            None => Err(StoreError::InvalidArgument("no list selected".to_string())),
        }
    }
}
