use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::registry::TaskRegistry;

/// Unique id of a scheduled unit of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Failure reported by (or caught around) a unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task failed: {0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type TaskResult = Result<(), TaskError>;

const PENDING: u8 = 0;
const CANCELLED: u8 = 1;
const COMPLETED: u8 = 2;

pub(crate) struct TaskShared {
    id: TaskId,
    label: Option<String>,
    state: AtomicU8,
    registry: TaskRegistry,
}

/// Cancellable, introspectable reference to a scheduled task.
///
/// Clones share state. Cancelling is idempotent: only the first call that
/// moves the task out of the pending state returns `true`.
#[derive(Clone)]
pub struct TaskHandle {
    shared: Arc<TaskShared>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, label: Option<String>, registry: TaskRegistry) -> Self {
        Self {
            shared: Arc::new(TaskShared {
                id,
                label,
                state: AtomicU8::new(PENDING),
                registry,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<TaskShared> {
        Arc::downgrade(&self.shared)
    }

    pub(crate) fn upgrade(weak: &Weak<TaskShared>) -> Option<Self> {
        weak.upgrade().map(|shared| Self { shared })
    }

    pub fn id(&self) -> TaskId {
        self.shared.id
    }

    pub fn label(&self) -> Option<&str> {
        self.shared.label.as_deref()
    }

    /// Stops future runs. Returns `false` if the task was already cancelled or
    /// has completed.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .shared
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled {
            self.shared.registry.remove(self.shared.id);
        }
        cancelled
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) == CANCELLED
    }

    /// True once the task is cancelled or has run to completion.
    pub fn is_finished(&self) -> bool {
        self.shared.state.load(Ordering::Acquire) != PENDING
    }

    /// Marks a one-shot task as done and drops it from the registry.
    pub(crate) fn complete(&self) {
        if self
            .shared
            .state
            .compare_exchange(PENDING, COMPLETED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.shared.registry.remove(self.shared.id);
        }
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.shared.id)
            .field("label", &self.shared.label)
            .field("state", &self.shared.state.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_cancel_returns_false() {
        let registry = TaskRegistry::new();
        let handle = registry.register(None);

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert!(handle.is_cancelled());
        assert!(handle.clone().is_cancelled());
    }

    #[test]
    fn completed_task_cannot_be_cancelled() {
        let registry = TaskRegistry::new();
        let handle = registry.register(Some("save".into()));

        handle.complete();

        assert!(!handle.cancel());
        assert!(!handle.is_cancelled());
        assert!(handle.is_finished());
        assert!(registry.is_empty());
    }
}
