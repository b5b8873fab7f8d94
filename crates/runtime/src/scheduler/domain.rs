//! Execution domain worker.
//!
//! Each domain is a tokio task that owns a command queue and a tick-driven
//! timer wheel. Work posted to a domain runs inside a [`CURRENT_DOMAIN`] scope
//! so the scheduler can detect when a caller is already on the right domain
//! and run inline instead of posting.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

use super::backend::DomainId;
use super::boundary::Boundary;
use super::handle::{TaskHandle, TaskResult};

tokio::task_local! {
    pub(crate) static CURRENT_DOMAIN: DomainId;
}

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;
pub(crate) type Work = Box<dyn FnMut() -> TaskResult + Send + 'static>;

/// A delayed or periodic unit of work waiting for its tick.
pub(crate) struct Timer {
    pub handle: TaskHandle,
    pub delay_ticks: u64,
    pub period_ticks: Option<u64>,
    pub work: Work,
}

pub(crate) enum DomainCommand {
    Run(Job),
    Schedule(Timer),
    Stop,
}

pub(crate) struct DomainWorker {
    id: DomainId,
    commands: mpsc::UnboundedReceiver<DomainCommand>,
    tick_duration: Duration,
    tick: u64,
    seq: u64,
    timers: BTreeMap<(u64, u64), Timer>,
    boundary: Boundary,
}

impl DomainWorker {
    pub fn new(
        id: DomainId,
        commands: mpsc::UnboundedReceiver<DomainCommand>,
        tick_duration: Duration,
        boundary: Boundary,
    ) -> Self {
        Self {
            id,
            commands,
            tick_duration,
            tick: 0,
            seq: 0,
            timers: BTreeMap::new(),
            boundary,
        }
    }

    /// Main worker loop. Returns after `Stop` or when every sender is gone.
    pub async fn run(self) {
        let id = self.id;
        CURRENT_DOMAIN.scope(id, self.run_scoped()).await;
    }

    async fn run_scoped(mut self) {
        debug!(target: "spell_runtime::scheduler", domain = %self.id, "domain started");

        let mut ticker = time::interval_at(
            time::Instant::now() + self.tick_duration,
            self.tick_duration,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(DomainCommand::Run(job)) => self.boundary.run_once(None, job),
                    Some(DomainCommand::Schedule(timer)) => self.insert(timer),
                    Some(DomainCommand::Stop) | None => break,
                },
                _ = ticker.tick() => {
                    self.tick += 1;
                    self.fire_due();
                }
            }
        }

        debug!(
            target: "spell_runtime::scheduler",
            domain = %self.id,
            pending = self.timers.len(),
            "domain stopped"
        );
    }

    fn insert(&mut self, timer: Timer) {
        let due = self.tick + timer.delay_ticks;
        self.push(due, timer);
    }

    fn push(&mut self, due: u64, timer: Timer) {
        self.seq += 1;
        self.timers.insert((due, self.seq), timer);
    }

    fn fire_due(&mut self) {
        while let Some(entry) = self.timers.first_entry() {
            if entry.key().0 > self.tick {
                break;
            }
            let mut timer = entry.remove();

            if timer.handle.is_finished() {
                trace!(
                    target: "spell_runtime::scheduler",
                    task_id = %timer.handle.id(),
                    "dropping cancelled task"
                );
                continue;
            }

            let succeeded = self.boundary.run_tick(&timer.handle, &mut timer.work);

            match timer.period_ticks {
                Some(period) if succeeded && !timer.handle.is_finished() => {
                    self.push(self.tick + period, timer);
                }
                Some(_) => {}
                None => timer.handle.complete(),
            }
        }
    }
}
