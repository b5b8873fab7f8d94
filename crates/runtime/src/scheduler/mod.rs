//! Affinity-aware task scheduling.
//!
//! Every piece of world-touching work goes through [`Scheduler`], which binds
//! it to one of four affinities and hands it to the domain that owns that
//! affinity right now:
//!
//! - [`Affinity::Entity`]: the domain owning the entity's current location
//!   (declined when the entity is offline)
//! - [`Affinity::Region`]: the domain owning a location
//! - [`Affinity::Global`]: the single authoritative domain
//! - [`Affinity::Async`]: the tokio pool, with no spatial binding
//!
//! The domain is resolved once, when the work is scheduled. A repeating task
//! stays on the domain it was first bound to.

mod backend;
mod boundary;
mod domain;
mod handle;
mod registry;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use spell_core::{EntityId, Location};

pub use backend::{ClassicBackend, DomainId, RegionalBackend, SchedulerBackend};
pub use handle::{TaskError, TaskHandle, TaskId, TaskResult};
pub use registry::TaskRegistry;

use boundary::Boundary;
use domain::{CURRENT_DOMAIN, DomainCommand, DomainWorker, Job, Timer, Work};

use crate::api::{Result, RuntimeError};
use crate::events::EventBus;
use crate::world::EntityDirectory;

/// Where a unit of work must run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Affinity {
    Entity(EntityId),
    Region(Location),
    Global,
    Async,
}

/// Concrete destination of an affinity at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    Domain(DomainId),
    Async,
}

/// What happened to an immediate `run` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Ran synchronously on the caller's thread.
    Inline,
    /// Queued on its domain.
    Posted,
    /// Dropped: the entity is offline or the domain is gone.
    Declined,
}

/// Timing of a delayed or periodic task, in scheduling units (ticks).
///
/// Delays and periods below one tick are raised to one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    delay_ticks: u64,
    period_ticks: Option<u64>,
    label: Option<String>,
}

impl Schedule {
    pub fn later(delay_ticks: u64) -> Self {
        Self {
            delay_ticks: delay_ticks.max(1),
            period_ticks: None,
            label: None,
        }
    }

    pub fn every(delay_ticks: u64, period_ticks: u64) -> Self {
        Self {
            delay_ticks: delay_ticks.max(1),
            period_ticks: Some(period_ticks.max(1)),
            label: None,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn delay_ticks(&self) -> u64 {
        self.delay_ticks
    }

    pub fn period_ticks(&self) -> Option<u64> {
        self.period_ticks
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// The affinity scheduler.
pub struct Scheduler {
    backend: Box<dyn SchedulerBackend>,
    domains: Vec<mpsc::UnboundedSender<DomainCommand>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    runtime: Handle,
    tick_duration: Duration,
    registry: TaskRegistry,
    entities: Arc<dyn EntityDirectory>,
    boundary: Boundary,
    shutting_down: AtomicBool,
}

impl Scheduler {
    /// Spawns one worker per domain on the current tokio runtime.
    pub fn start(
        backend: Box<dyn SchedulerBackend>,
        tick_duration: Duration,
        entities: Arc<dyn EntityDirectory>,
        events: EventBus,
    ) -> Result<Arc<Self>> {
        let runtime = Handle::try_current().map_err(RuntimeError::NoAsyncRuntime)?;
        let tick_duration = tick_duration.max(Duration::from_millis(1));
        let boundary = Boundary::new(events);

        let mut domains = Vec::with_capacity(backend.domain_count());
        let mut workers = Vec::with_capacity(backend.domain_count());
        for index in 0..backend.domain_count() {
            let (tx, rx) = mpsc::unbounded_channel();
            let worker = DomainWorker::new(DomainId(index), rx, tick_duration, boundary.clone());
            workers.push(runtime.spawn(worker.run()));
            domains.push(tx);
        }

        info!(
            target: "spell_runtime::scheduler",
            backend = backend.name(),
            domains = domains.len(),
            tick_ms = tick_duration.as_millis() as u64,
            "scheduler started"
        );

        Ok(Arc::new(Self {
            backend,
            domains,
            workers: Mutex::new(workers),
            runtime,
            tick_duration,
            registry: TaskRegistry::new(),
            entities,
            boundary,
            shutting_down: AtomicBool::new(false),
        }))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Domain the calling code is running on, if any.
    pub fn current_domain() -> Option<DomainId> {
        CURRENT_DOMAIN.try_with(|domain| *domain).ok()
    }

    /// Resolves an affinity against the current world state.
    ///
    /// Returns `None` for an entity that is offline.
    pub fn resolve(&self, affinity: &Affinity) -> Option<Target> {
        match affinity {
            Affinity::Entity(id) => self
                .entities
                .locate(*id)
                .map(|location| Target::Domain(self.backend.region(&location))),
            Affinity::Region(location) => Some(Target::Domain(self.backend.region(location))),
            Affinity::Global => Some(Target::Domain(self.backend.global())),
            Affinity::Async => Some(Target::Async),
        }
    }

    /// True when the caller already runs on the domain owning `affinity`.
    pub fn is_current(&self, affinity: &Affinity) -> bool {
        match (self.resolve(affinity), Self::current_domain()) {
            (Some(Target::Domain(target)), Some(current)) => target == current,
            _ => false,
        }
    }

    /// Runs `work` as soon as possible on the domain owning `affinity`.
    ///
    /// Work runs inline when the caller is already on that domain, and always
    /// inline once shutdown has begun.
    pub fn run<F>(&self, affinity: Affinity, work: F) -> Dispatch
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_shutting_down() {
            self.boundary.run_once(None, work);
            return Dispatch::Inline;
        }

        match self.resolve(&affinity) {
            None => {
                trace!(target: "spell_runtime::scheduler", ?affinity, "entity offline; declined");
                Dispatch::Declined
            }
            Some(Target::Async) => {
                let boundary = self.boundary.clone();
                self.runtime.spawn(async move { boundary.run_once(None, work) });
                Dispatch::Posted
            }
            Some(Target::Domain(domain)) if Self::current_domain() == Some(domain) => {
                self.boundary.run_once(None, work);
                Dispatch::Inline
            }
            Some(Target::Domain(domain)) => {
                let job: Job = Box::new(work);
                if self.send(domain, DomainCommand::Run(job)) {
                    Dispatch::Posted
                } else {
                    Dispatch::Declined
                }
            }
        }
    }

    /// Schedules delayed or periodic work.
    ///
    /// Returns `None` when the affinity cannot be resolved or shutdown has
    /// begun. A periodic task whose invocation fails is cancelled after that
    /// invocation.
    pub fn schedule<F>(&self, affinity: Affinity, schedule: Schedule, work: F) -> Option<TaskHandle>
    where
        F: FnMut() -> TaskResult + Send + 'static,
    {
        if self.is_shutting_down() {
            debug!(
                target: "spell_runtime::scheduler",
                label = schedule.label().unwrap_or("-"),
                "shutting down; task dropped"
            );
            return None;
        }

        let target = self.resolve(&affinity)?;
        let handle = self.registry.register(schedule.label.clone());
        let work: Work = Box::new(work);

        match target {
            Target::Async => self.spawn_async(handle.clone(), &schedule, work),
            Target::Domain(domain) => {
                let timer = Timer {
                    handle: handle.clone(),
                    delay_ticks: schedule.delay_ticks,
                    period_ticks: schedule.period_ticks,
                    work,
                };
                if !self.send(domain, DomainCommand::Schedule(timer)) {
                    handle.cancel();
                    return None;
                }
            }
        }

        trace!(
            target: "spell_runtime::scheduler",
            task_id = %handle.id(),
            label = schedule.label().unwrap_or("-"),
            ?affinity,
            delay = schedule.delay_ticks,
            period = ?schedule.period_ticks,
            "task scheduled"
        );
        Some(handle)
    }

    /// Runs `work` once after `delay_ticks`.
    pub fn run_later<F>(&self, affinity: Affinity, delay_ticks: u64, work: F) -> Option<TaskHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut work = Some(work);
        self.schedule(affinity, Schedule::later(delay_ticks), move || {
            if let Some(work) = work.take() {
                work();
            }
            Ok(())
        })
    }

    /// Runs `work` every `period_ticks`, starting after `delay_ticks`.
    pub fn run_timer<F>(
        &self,
        affinity: Affinity,
        delay_ticks: u64,
        period_ticks: u64,
        work: F,
    ) -> Option<TaskHandle>
    where
        F: FnMut() -> TaskResult + Send + 'static,
    {
        self.schedule(affinity, Schedule::every(delay_ticks, period_ticks), work)
    }

    fn spawn_async(&self, handle: TaskHandle, schedule: &Schedule, mut work: Work) {
        let boundary = self.boundary.clone();
        let delay = self.tick_duration * ticks_u32(schedule.delay_ticks);
        let period = schedule
            .period_ticks
            .map(|period| self.tick_duration * ticks_u32(period));

        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            loop {
                if handle.is_finished() {
                    return;
                }
                if !boundary.run_tick(&handle, &mut work) {
                    return;
                }
                match period {
                    Some(period) => tokio::time::sleep(period).await,
                    None => {
                        handle.complete();
                        return;
                    }
                }
            }
        });
    }

    fn send(&self, domain: DomainId, command: DomainCommand) -> bool {
        let Some(sender) = self.domains.get(domain.0) else {
            return false;
        };
        if sender.send(command).is_err() {
            debug!(target: "spell_runtime::scheduler", %domain, "domain closed; work dropped");
            return false;
        }
        true
    }

    /// Begins shutdown: later immediate work runs inline, later delayed and
    /// periodic work is dropped, and the task registry is cleared. Domains are
    /// asked to stop; call [`Scheduler::join`] to wait for them.
    ///
    /// Returns `false` if shutdown had already begun.
    pub fn shutdown(&self) -> bool {
        if self.shutting_down.swap(true, Ordering::AcqRel) {
            return false;
        }
        let cleared = self.registry.len();
        self.registry.clear();
        for sender in &self.domains {
            let _ = sender.send(DomainCommand::Stop);
        }
        info!(
            target: "spell_runtime::scheduler",
            cleared_tasks = cleared,
            "scheduler shutting down"
        );
        true
    }

    /// Waits for every domain worker to exit.
    pub async fn join(&self) -> Result<()> {
        let workers = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for worker in workers {
            worker.await.map_err(RuntimeError::WorkerJoin)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("backend", &self.backend.name())
            .field("domains", &self.domains.len())
            .field("tick", &self.tick_duration)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

fn ticks_u32(ticks: u64) -> u32 {
    u32::try_from(ticks).unwrap_or(u32::MAX)
}

/// Runs `work` inside the panic boundary without a scheduler, for code paths
/// that must not unwind into their caller.
pub(crate) fn guarded<T>(work: impl FnOnce() -> T) -> std::result::Result<T, TaskError> {
    panic::catch_unwind(AssertUnwindSafe(work))
        .map_err(|payload| TaskError::Panicked(boundary::panic_message(payload.as_ref())))
}
