use std::sync::{Arc, Weak};

use spell_core::{MagicSettings, PerkTable};
use tracing::{debug, trace};

use crate::api::{Result, RuntimeError};
use crate::casters::CasterManager;
use crate::scheduler::{Affinity, Dispatch, Schedule, Scheduler, TaskHandle};

/// Periodic magic regeneration for every loaded caster.
pub(crate) struct RegenWorker {
    scheduler: Weak<Scheduler>,
    casters: Arc<CasterManager>,
    perks: Arc<PerkTable>,
    amount: u32,
}

impl RegenWorker {
    pub fn spawn(
        scheduler: &Arc<Scheduler>,
        casters: Arc<CasterManager>,
        perks: Arc<PerkTable>,
        settings: MagicSettings,
    ) -> Result<TaskHandle> {
        let worker = Self {
            scheduler: Arc::downgrade(scheduler),
            casters,
            perks,
            amount: settings.regen_amount,
        };
        let interval = settings.regen_interval_ticks;

        let handle = scheduler
            .schedule(
                Affinity::Global,
                Schedule::every(interval, interval).labeled("worker:regen"),
                move || {
                    worker.tick();
                    Ok(())
                },
            )
            .ok_or(RuntimeError::WorkerNotScheduled("regen"))?;

        debug!(target: "spell_runtime::workers", interval_ticks = interval, "regen worker started");
        Ok(handle)
    }

    fn tick(&self) {
        let Some(scheduler) = self.scheduler.upgrade() else {
            return;
        };

        let mut dispatched = 0usize;
        for entry in self.casters.entries() {
            let house = entry.lock().house().map(str::to_owned);
            let amount = self
                .amount
                .saturating_add(self.perks.bonus_regen(house.as_deref()));
            if amount == 0 {
                continue;
            }

            let id = entry.id();
            let outcome = scheduler.run(Affinity::Entity(id), move || {
                entry.lock().regenerate_magic(amount);
            });
            if outcome != Dispatch::Declined {
                dispatched += 1;
            }
        }

        trace!(target: "spell_runtime::workers", dispatched, "magic regenerated");
    }
}
