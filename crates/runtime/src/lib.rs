//! Runtime orchestration for the spell engine.
//!
//! This crate layers scheduling, concurrency and persistence on top of the
//! pure rules in `spell-core`. Consumers build a [`Runtime`], register spells,
//! and drive casts through the shared [`SpellEngine`].
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] dispatches work by affinity (entity, region, global, async)
//!   onto a classic or regional set of execution domains
//! - [`engine`] runs the cast lifecycle and the input layer
//! - [`spells`] holds the spell registry and the active instance registry
//! - [`casters`] loads, caches and saves caster state
//! - [`hooks`] provides pre-cast interceptors
//! - [`events`] provides the topic-based event bus
//! - [`world`] declares the contracts the engine consumes from the host world
//! - [`repository`] persists caster records
//! - [`runtime`] hosts the orchestrator and builder
pub mod api;
pub mod casters;
pub mod clock;
pub mod config;
pub mod engine;
pub mod events;
pub mod hooks;
pub mod repository;
pub mod runtime;
pub mod scheduler;
pub mod spells;
pub mod world;

mod workers;

pub use api::{Result, RuntimeError};
pub use casters::{CastGate, CasterEntry, CasterManager};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BackendKind, RuntimeConfig};
pub use engine::{Denial, InputAction, InputResult, SlotInfo, SpellEngine};
pub use events::{CastEvent, Event, EventBus, InstanceId, SpellEvent, TaskEvent, Topic};
pub use hooks::{CastInterceptor, InterceptorRegistry, PreCast};
pub use repository::{CasterRepository, FileCasterRepo, InMemoryCasterRepo, RepositoryError};
pub use runtime::{Runtime, RuntimeBuilder};
pub use scheduler::{
    Affinity, ClassicBackend, Dispatch, DomainId, RegionalBackend, Schedule, Scheduler,
    SchedulerBackend, Target, TaskError, TaskHandle, TaskId, TaskRegistry, TaskResult,
};
pub use spells::{
    ActiveInstanceRegistry, ActiveSpell, CastContext, Progress, RegisteredSpell, Spell,
    SpellInstance, SpellRegistry, StopReason, TickContext, TrackRequest,
};
pub use world::{
    AllowAll, EntityDirectory, EntityTable, NoCastZones, PermissionProvider, PermissionTable,
    WorldProtection,
};
