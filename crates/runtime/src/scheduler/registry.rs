//! Weakly-held index of scheduled tasks.
//!
//! The registry hands out identifiers and lets administrative code find a task
//! by id. It never keeps a task alive: the owner of a [`TaskHandle`] (and the
//! domain that will run it) hold the strong references.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::handle::{TaskHandle, TaskId, TaskShared};

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    tasks: Mutex<HashMap<TaskId, Weak<TaskShared>>>,
}

/// Shared task registry. Cloning shares the same table.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RegistryInner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn tasks(&self) -> MutexGuard<'_, HashMap<TaskId, Weak<TaskShared>>> {
        self.inner
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocates an id, builds a handle and indexes it.
    pub fn register(&self, label: Option<String>) -> TaskHandle {
        let id = TaskId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = TaskHandle::new(id, label, self.clone());
        self.tasks().insert(id, handle.downgrade());
        handle
    }

    /// Returns the task if something still holds it; evicts stale entries.
    pub fn lookup(&self, id: TaskId) -> Option<TaskHandle> {
        let mut tasks = self.tasks();
        match tasks.get(&id).map(TaskHandle::upgrade) {
            Some(Some(handle)) => Some(handle),
            Some(None) => {
                tasks.remove(&id);
                None
            }
            None => None,
        }
    }

    pub(crate) fn remove(&self, id: TaskId) {
        self.tasks().remove(&id);
    }

    /// Live tasks, sorted by id. Stale entries are evicted on the way.
    pub fn snapshot(&self) -> Vec<TaskHandle> {
        let mut tasks = self.tasks();
        tasks.retain(|_, weak| weak.strong_count() > 0);
        let mut live: Vec<TaskHandle> = tasks.values().filter_map(TaskHandle::upgrade).collect();
        live.sort_by_key(TaskHandle::id);
        live
    }

    /// Number of indexed entries, stale ones included.
    pub fn len(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks().is_empty()
    }

    /// Forgets every task without cancelling any of them.
    pub fn clear(&self) {
        self.tasks().clear();
    }
}
