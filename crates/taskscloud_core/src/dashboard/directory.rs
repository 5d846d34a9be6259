//! In-memory projection of the lists visible to the current identity.
//!
//! # Invariants
//! - The cache belongs to exactly one identity (`owner`) at a time; a
//!   different caller triggers a wholesale re-fetch, never a merge.
//! - Local state changes only after the store confirmed the write.

use crate::model::identity::IdentityId;
use crate::model::list::{ListId, TaskList};
use crate::repo::list_repo::ListRepository;
use crate::repo::task_repo::TaskRepository;
use crate::service::task_store::{StoreResult, TaskStore};
use crate::session::context::SessionContext;
use log::{debug, warn};

/// Read-through cache of `list_all_visible`.
#[derive(Debug, Clone, Default)]
pub struct ListDirectory {
    owner: Option<IdentityId>,
    lists: Vec<TaskList>,
}

impl ListDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity the cached lists were fetched for.
    pub fn owner(&self) -> Option<&IdentityId> {
        self.owner.as_ref()
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn get(&self, list_id: ListId) -> Option<&TaskList> {
        self.lists.iter().find(|list| list.id == list_id)
    }

    pub fn favorites(&self) -> impl Iterator<Item = &TaskList> {
        self.lists.iter().filter(|list| list.favorite)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn clear(&mut self) {
        self.owner = None;
        self.lists.clear();
    }

    /// Re-fetches every visible list for `caller`.
    ///
    /// On failure the cache is kept only if it already belonged to `caller`.
    pub fn refresh<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
    ) -> StoreResult<()> {
        match store.list_all_visible(caller) {
            Ok(lists) => {
                self.owner = caller.cloned();
                self.lists = lists;
                debug!(
                    "event=directory_refresh module=dashboard status=ok count={}",
                    self.lists.len()
                );
                Ok(())
            }
            Err(err) => {
                if self.owner.as_ref() != caller {
                    self.clear();
                }
                Err(err)
            }
        }
    }

    /// Aligns the cache with the identity in `context`.
    ///
    /// Returns `true` when the identity changed (cache cleared or re-fetched).
    pub fn sync_identity<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        context: &SessionContext,
    ) -> StoreResult<bool> {
        let uid = context.uid();
        if uid == self.owner {
            return Ok(false);
        }
        match uid {
            Some(uid) => self.refresh(store, Some(&uid))?,
            None => self.clear(),
        }
        Ok(true)
    }

    /// Creates a list and appends it once the store confirms.
    ///
    /// A cache held for another identity (or none) is re-fetched for
    /// `caller` instead, so the new list is visible either way.
    pub fn create_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        name: &str,
    ) -> StoreResult<TaskList> {
        let list = store.create_list(caller, name)?;
        if self.owner.as_ref() == caller {
            self.lists.push(list.clone());
        } else if let Err(err) = self.refresh(store, caller) {
            warn!(
                "event=directory_refresh module=dashboard status=error list_id={} error_code={}",
                list.id,
                err.kind().code()
            );
        }
        Ok(list)
    }

    pub fn rename_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        list_id: ListId,
        name: &str,
    ) -> StoreResult<TaskList> {
        let list = store.rename_list(list_id, caller, name)?;
        self.replace_cached(list.clone());
        Ok(list)
    }

    pub fn set_favorite<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        list_id: ListId,
        favorite: bool,
    ) -> StoreResult<TaskList> {
        let list = store.set_list_favorite(list_id, caller, favorite)?;
        self.replace_cached(list.clone());
        Ok(list)
    }

    pub fn delete_list<L: ListRepository, T: TaskRepository>(
        &mut self,
        store: &TaskStore<L, T>,
        caller: Option<&IdentityId>,
        list_id: ListId,
    ) -> StoreResult<()> {
        store.delete_list(list_id, caller)?;
        self.lists.retain(|list| list.id != list_id);
        Ok(())
    }

    fn replace_cached(&mut self, list: TaskList) {
        if let Some(cached) = self.lists.iter_mut().find(|cached| cached.id == list.id) {
            *cached = list;
        }
    }
}
