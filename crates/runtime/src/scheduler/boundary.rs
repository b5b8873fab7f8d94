//! Failure boundary wrapped around every unit of scheduled work.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use super::handle::{TaskError, TaskHandle, TaskResult};
use crate::events::{Event, EventBus, TaskEvent};

/// Catches errors and panics from scheduled work, logs them, and cancels the
/// failing task so it never runs again.
#[derive(Clone)]
pub(crate) struct Boundary {
    events: EventBus,
}

impl Boundary {
    pub fn new(events: EventBus) -> Self {
        Self { events }
    }

    /// Runs one-shot work. A panic is logged and swallowed.
    pub fn run_once(&self, handle: Option<&TaskHandle>, job: impl FnOnce()) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let error = TaskError::Panicked(panic_message(payload.as_ref()));
            self.report(handle, &error);
        }
    }

    /// Runs a single invocation of a (possibly periodic) task.
    ///
    /// Returns `false` when the invocation failed; the task is then cancelled.
    pub fn run_tick<W>(&self, handle: &TaskHandle, work: &mut W) -> bool
    where
        W: FnMut() -> TaskResult + ?Sized,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(|| work()))
            .unwrap_or_else(|payload| Err(TaskError::Panicked(panic_message(payload.as_ref()))));

        match result {
            Ok(()) => true,
            Err(error) => {
                handle.cancel();
                self.report(Some(handle), &error);
                false
            }
        }
    }

    fn report(&self, handle: Option<&TaskHandle>, error: &TaskError) {
        let task = handle.map(TaskHandle::id);
        let label = handle.and_then(TaskHandle::label).map(str::to_owned);

        match task {
            Some(task_id) => warn!(
                target: "spell_runtime::scheduler",
                %task_id,
                label = label.as_deref().unwrap_or("-"),
                error = %error,
                "scheduled task failed; cancelling"
            ),
            None => warn!(
                target: "spell_runtime::scheduler",
                error = %error,
                "posted work failed"
            ),
        }

        self.events.publish(Event::Task(TaskEvent::Failed {
            task,
            label,
            error: error.to_string(),
        }));
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
