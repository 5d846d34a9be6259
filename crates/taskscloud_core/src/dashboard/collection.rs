//! In-memory tasks of the active list.

use crate::model::list::ListId;
use crate::model::task::{Task, TaskId};

/// Read-through cache holding the tasks of at most one list.
///
/// Mutators are crate-private: only the selection controller writes here,
/// and only after the store confirmed the change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    list_id: Option<ListId>,
    tasks: Vec<Task>,
}

impl TaskCollection {
    /// List the cached tasks belong to, if loaded.
    pub fn list_id(&self) -> Option<ListId> {
        self.list_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.completed).count()
    }

    /// Swaps in `tasks` for `list_id`, dropping anything cached before.
    pub(crate) fn replace(&mut self, list_id: ListId, mut tasks: Vec<Task>) {
        tasks.retain(|task| task.list_id == list_id);
        self.list_id = Some(list_id);
        self.tasks = tasks;
    }

    pub(crate) fn clear(&mut self) {
        self.list_id = None;
        self.tasks.clear();
    }

    pub(crate) fn push(&mut self, task: Task) -> bool {
        if self.list_id != Some(task.list_id) {
            return false;
        }
        self.tasks.push(task);
        true
    }

    pub(crate) fn upsert(&mut self, task: Task) -> bool {
        if self.list_id != Some(task.list_id) {
            return false;
        }
        match self.tasks.iter_mut().find(|cached| cached.id == task.id) {
            Some(cached) => *cached = task,
            None => self.tasks.push(task),
        }
        true
    }

    pub(crate) fn remove(&mut self, task_id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != task_id);
        self.tasks.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::TaskCollection;
    use crate::model::task::Task;
    use uuid::Uuid;

    fn task(list_id: Uuid, name: &str) -> Task {
        Task {
            id: Uuid::new_v4(),
            list_id,
            name: name.to_string(),
            description: String::new(),
            date: None,
            completed: false,
            created_at: 1,
            updated_at: 1,
        }
    }

    #[test]
    fn replace_keeps_only_tasks_of_the_target_list() {
        let list_a = Uuid::new_v4();
        let list_b = Uuid::new_v4();
        let mut collection = TaskCollection::default();

        collection.replace(list_a, vec![task(list_a, "one"), task(list_b, "stray")]);
        assert_eq!(collection.list_id(), Some(list_a));
        assert_eq!(collection.len(), 1);

        collection.replace(list_b, vec![task(list_b, "two")]);
        assert_eq!(collection.list_id(), Some(list_b));
        assert!(collection.tasks().iter().all(|task| task.list_id == list_b));
    }

    #[test]
    fn push_rejects_tasks_of_other_lists() {
        let list_a = Uuid::new_v4();
        let mut collection = TaskCollection::default();
        assert!(!collection.push(task(list_a, "unloaded")));

        collection.replace(list_a, Vec::new());
        assert!(collection.push(task(list_a, "one")));
        assert!(!collection.push(task(Uuid::new_v4(), "foreign")));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn upsert_and_remove_track_membership() {
        let list_a = Uuid::new_v4();
        let mut collection = TaskCollection::default();
        let mut first = task(list_a, "one");
        collection.replace(list_a, vec![first.clone()]);

        first.completed = true;
        assert!(collection.upsert(first.clone()));
        assert_eq!(collection.completed_count(), 1);

        assert!(collection.remove(first.id));
        assert!(!collection.remove(first.id));
        assert!(collection.is_empty());
    }
}
