use std::sync::{Arc, Weak};

use tracing::debug;

use crate::api::{Result, RuntimeError};
use crate::casters::CasterManager;
use crate::scheduler::{Affinity, Schedule, Scheduler, TaskHandle};

/// Periodic save of every loaded caster.
pub(crate) struct AutosaveWorker;

impl AutosaveWorker {
    pub fn spawn(
        scheduler: &Arc<Scheduler>,
        casters: Arc<CasterManager>,
        interval_ticks: u64,
    ) -> Result<TaskHandle> {
        let weak: Weak<Scheduler> = Arc::downgrade(scheduler);

        let handle = scheduler
            .schedule(
                Affinity::Async,
                Schedule::every(interval_ticks, interval_ticks).labeled("worker:autosave"),
                move || {
                    if let Some(scheduler) = weak.upgrade() {
                        let dispatched = casters.save_all(&scheduler);
                        debug!(target: "spell_runtime::workers", dispatched, "auto-save dispatched");
                    }
                    Ok(())
                },
            )
            .ok_or(RuntimeError::WorkerNotScheduled("autosave"))?;

        debug!(
            target: "spell_runtime::workers",
            interval_ticks,
            "auto-save worker started"
        );
        Ok(handle)
    }
}
