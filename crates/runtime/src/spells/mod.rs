//! Spell behaviour contracts, the spell registry and active instances.
//!
//! A registered spell pairs an immutable [`SpellDefinition`] with a [`Spell`]
//! implementation. Each successful cast asks the spell for a fresh
//! [`SpellInstance`], runs its one-shot `execute`, and, if the instance needs
//! ongoing behaviour, hands it to the [`ActiveInstanceRegistry`] which calls
//! `progress` once per tick until the instance stops.

mod active;
mod registry;

pub use active::{ActiveInstanceRegistry, ActiveSpell, TrackRequest};
pub use registry::{RegisteredSpell, SpellRegistry};

use serde::{Deserialize, Serialize};
use spell_core::{Caster, CastOutcome, EntityId, Location, SpellDefinition};

use crate::scheduler::Scheduler;
use crate::world::EntityDirectory;

/// Why an active instance stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopReason {
    /// The instance reached its own end condition.
    Finished,
    /// The caster went offline or was unloaded.
    CasterOffline,
    /// The instance moved beyond the spell's range from its caster.
    OutOfRange,
    /// Stopped from outside (admin command, unregistration).
    Forced,
    /// The runtime is shutting down.
    Shutdown,
    /// `progress` failed or panicked.
    Failed,
}

/// What an instance wants after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    Stop(StopReason),
}

/// Behaviour shared by every cast of one spell.
pub trait Spell: Send + Sync {
    /// Called once when the spell is registered.
    fn on_load(&self, _definition: &SpellDefinition) {}

    /// Called once when the spell is unregistered.
    fn on_unload(&self, _definition: &SpellDefinition) {}

    /// Spell-specific veto, checked together with the enabled flag.
    fn can_cast(&self, _caster: &Caster) -> bool {
        true
    }

    /// Creates the per-cast state for one attempt.
    fn begin(&self, ctx: &CastContext<'_>) -> Box<dyn SpellInstance>;
}

/// State and behaviour of one cast.
///
/// `progress` and `on_stop` are never called concurrently, and `progress` is
/// never called after `on_stop`. Returning [`Progress::Stop`] is the usual way
/// to end. If `progress` stops its own instance through the engine instead
/// (a disconnect or force stop), `on_stop` runs once `progress` has returned.
pub trait SpellInstance: Send {
    /// One-shot effect, run synchronously during the cast.
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome;

    /// Whether a successful cast should be tracked and ticked.
    fn needs_ticking(&self) -> bool {
        true
    }

    fn progress(&mut self, _ctx: &mut TickContext<'_>) -> Progress {
        Progress::Stop(StopReason::Finished)
    }

    /// Terminal cleanup. Runs exactly once per tracked instance.
    fn on_stop(&mut self, _reason: StopReason) {}

    /// Current anchor of the effect, when it differs from the caster.
    fn location(&self) -> Option<Location> {
        None
    }
}

/// Everything `begin` and `execute` may look at.
pub struct CastContext<'a> {
    pub caster: EntityId,
    pub origin: Location,
    pub definition: &'a SpellDefinition,
    /// Effective cost after perks and interceptors.
    pub magic_cost: Option<u32>,
    pub now_ms: u64,
    scheduler: &'a Scheduler,
    entities: &'a dyn EntityDirectory,
}

impl<'a> CastContext<'a> {
    pub(crate) fn new(
        caster: EntityId,
        origin: Location,
        definition: &'a SpellDefinition,
        magic_cost: Option<u32>,
        now_ms: u64,
        scheduler: &'a Scheduler,
        entities: &'a dyn EntityDirectory,
    ) -> Self {
        Self {
            caster,
            origin,
            definition,
            magic_cost,
            now_ms,
            scheduler,
            entities,
        }
    }

    /// Scheduler for follow-up effects (delayed hits, async lookups).
    pub fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    pub fn locate(&self, id: EntityId) -> Option<Location> {
        self.entities.locate(id)
    }
}

/// Everything `progress` may look at.
pub struct TickContext<'a> {
    /// 1 on the first tick after the cast.
    pub tick: u64,
    pub caster: EntityId,
    pub caster_location: Location,
    pub definition: &'a SpellDefinition,
    pub elapsed_ms: u64,
    scheduler: &'a Scheduler,
    entities: &'a dyn EntityDirectory,
}

impl<'a> TickContext<'a> {
    pub(crate) fn new(
        tick: u64,
        caster: EntityId,
        caster_location: Location,
        definition: &'a SpellDefinition,
        elapsed_ms: u64,
        scheduler: &'a Scheduler,
        entities: &'a dyn EntityDirectory,
    ) -> Self {
        Self {
            tick,
            caster,
            caster_location,
            definition,
            elapsed_ms,
            scheduler,
            entities,
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        self.scheduler
    }

    pub fn locate(&self, id: EntityId) -> Option<Location> {
        self.entities.locate(id)
    }
}
