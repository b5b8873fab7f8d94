//! High-level runtime orchestrator.
//!
//! The runtime starts the scheduler domains, assembles the engine from its
//! collaborators, runs the background workers and owns the shutdown sequence.

use std::sync::Arc;

use spell_core::{HouseBook, PerkTable};
use tokio::sync::broadcast;
use tracing::info;

use crate::api::Result;
use crate::casters::CasterManager;
use crate::clock::{Clock, SystemClock};
use crate::config::RuntimeConfig;
use crate::engine::{EngineParts, SpellEngine};
use crate::events::{Event, EventBus, Topic};
use crate::hooks::{CastInterceptor, InterceptorRegistry};
use crate::repository::{CasterRepository, InMemoryCasterRepo};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::spells::{ActiveInstanceRegistry, SpellRegistry, StopReason};
use crate::workers::{AutosaveWorker, RegenWorker};
use crate::world::{AllowAll, EntityDirectory, EntityTable, PermissionProvider, WorldProtection};

/// Running spell engine plus its scheduler and workers.
///
/// Design: the runtime owns lifecycle; [`SpellEngine`] is the shared façade
/// that callers clone out through [`Runtime::engine`].
pub struct Runtime {
    config: RuntimeConfig,
    engine: Arc<SpellEngine>,
    scheduler: Arc<Scheduler>,
    events: EventBus,
    workers: Vec<TaskHandle>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn engine(&self) -> Arc<SpellEngine> {
        Arc::clone(&self.engine)
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to a single event topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    /// Stops every active instance, saves all loaded casters, then shuts the
    /// scheduler down and waits for its domains to exit.
    pub async fn shutdown(&self) -> Result<()> {
        let stopped = self
            .engine
            .instances()
            .stop_all(StopReason::Shutdown);
        let saved = self.engine.casters().save_all_now();

        for worker in &self.workers {
            worker.cancel();
        }

        self.scheduler.shutdown();
        self.scheduler.join().await?;

        info!(
            target: "spell_runtime::runtime",
            stopped_instances = stopped,
            saved_casters = saved,
            "runtime shut down"
        );
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    repository: Option<Arc<dyn CasterRepository>>,
    entities: Option<Arc<dyn EntityDirectory>>,
    permissions: Option<Arc<dyn PermissionProvider>>,
    protections: Vec<Arc<dyn WorldProtection>>,
    interceptors: Vec<Arc<dyn CastInterceptor>>,
    perks: PerkTable,
    houses: HouseBook,
    clock: Option<Arc<dyn Clock>>,
    spells: Option<Arc<SpellRegistry>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            repository: None,
            entities: None,
            permissions: None,
            protections: Vec::new(),
            interceptors: Vec::new(),
            perks: PerkTable::default(),
            houses: HouseBook::default(),
            clock: None,
            spells: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Caster persistence (default: in-memory).
    pub fn repository(mut self, repository: Arc<dyn CasterRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Entity locations (default: an empty [`EntityTable`]).
    pub fn entities(mut self, entities: Arc<dyn EntityDirectory>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Permission checks (default: [`AllowAll`]).
    pub fn permissions(mut self, permissions: Arc<dyn PermissionProvider>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Adds a world protection consulted by the input layer.
    pub fn protection(mut self, protection: Arc<dyn WorldProtection>) -> Self {
        self.protections.push(protection);
        self
    }

    /// Adds a pre-cast interceptor.
    pub fn interceptor(mut self, interceptor: Arc<dyn CastInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn perks(mut self, perks: PerkTable) -> Self {
        self.perks = perks;
        self
    }

    pub fn houses(mut self, houses: HouseBook) -> Self {
        self.houses = houses;
        self
    }

    /// Cooldown clock (default: [`SystemClock`]).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Use a pre-populated spell registry instead of an empty one.
    pub fn spells(mut self, spells: Arc<SpellRegistry>) -> Self {
        self.spells = Some(spells);
        self
    }

    /// Build the runtime. Must be awaited inside a tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let config = self.config;
        let events = EventBus::with_capacity(config.event_buffer_size);
        let entities = self
            .entities
            .unwrap_or_else(|| Arc::new(EntityTable::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let repository = self
            .repository
            .unwrap_or_else(|| Arc::new(InMemoryCasterRepo::new()));
        let spells = self.spells.unwrap_or_default();
        let perks = Arc::new(self.perks);
        let houses = Arc::new(self.houses);

        let scheduler = Scheduler::start(
            config.backend.build(),
            config.tick,
            Arc::clone(&entities),
            events.clone(),
        )?;

        let casters = Arc::new(CasterManager::new(
            repository,
            config.magic,
            Arc::clone(&spells),
            Arc::clone(&houses),
        ));
        let instances = Arc::new(ActiveInstanceRegistry::new(
            Arc::clone(&scheduler),
            Arc::clone(&entities),
            events.clone(),
            Arc::clone(&clock),
            config.rebind_moving_instances,
        ));

        let workers = vec![
            RegenWorker::spawn(&scheduler, Arc::clone(&casters), Arc::clone(&perks), config.magic)?,
            AutosaveWorker::spawn(&scheduler, Arc::clone(&casters), config.autosave_interval_ticks)?,
        ];

        let engine = Arc::new(SpellEngine::new(EngineParts {
            spells,
            casters,
            instances,
            scheduler: Arc::clone(&scheduler),
            entities,
            permissions: self.permissions.unwrap_or_else(|| Arc::new(AllowAll)),
            protections: self.protections,
            perks,
            houses,
            interceptors: InterceptorRegistry::new(self.interceptors),
            events: events.clone(),
            clock,
        }));

        info!(
            target: "spell_runtime::runtime",
            backend = scheduler.backend_name(),
            domains = scheduler.domain_count(),
            "runtime started"
        );

        Ok(Runtime {
            config,
            engine,
            scheduler,
            events,
            workers,
        })
    }
}
