//! Spell lifecycle controller.
//!
//! [`SpellEngine`] is the entry point for everything a caster does: it runs
//! the admission protocol, executes the spell, commits resources, hands
//! ticking instances to the [`ActiveInstanceRegistry`], and exposes the slot,
//! cooldown and magic queries that a command or input layer needs.
//!
//! # Admission
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the spell is enabled and its behaviour accepts the caster
//! 2. the caster holds the spell permission, then the element permission
//! 3. the spell is not on cooldown
//! 4. the magic pool covers the effective cost
//!
//! Interceptors run next, then `execute`. Only a successful execution
//! consumes magic and starts the cooldown.

mod input;

pub use input::{Denial, InputAction, InputResult, SlotInfo};

use std::sync::Arc;

use spell_core::{
    CastOutcome, Caster, EntityId, HouseBook, PerkTable, SlotError, SpellDefinition, SpellKey,
};
use tracing::{debug, info, warn};

use crate::api::Result;
use crate::casters::CasterManager;
use crate::clock::Clock;
use crate::events::{CastEvent, Event, EventBus, InstanceId};
use crate::hooks::{InterceptorRegistry, PreCast};
use crate::scheduler::{self, Scheduler};
use crate::spells::{
    ActiveInstanceRegistry, ActiveSpell, CastContext, RegisteredSpell, SpellRegistry, StopReason,
    TrackRequest,
};
use crate::world::{EntityDirectory, PermissionProvider, WorldProtection};

/// Magic cost and cooldown after perks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Effective {
    magic_cost: Option<u32>,
    cooldown_ms: Option<u64>,
}

/// Collaborators shared by the engine, assembled by the runtime builder.
pub(crate) struct EngineParts {
    pub spells: Arc<SpellRegistry>,
    pub casters: Arc<CasterManager>,
    pub instances: Arc<ActiveInstanceRegistry>,
    pub scheduler: Arc<Scheduler>,
    pub entities: Arc<dyn EntityDirectory>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub protections: Vec<Arc<dyn WorldProtection>>,
    pub perks: Arc<PerkTable>,
    pub houses: Arc<HouseBook>,
    pub interceptors: InterceptorRegistry,
    pub events: EventBus,
    pub clock: Arc<dyn Clock>,
}

pub struct SpellEngine {
    spells: Arc<SpellRegistry>,
    casters: Arc<CasterManager>,
    instances: Arc<ActiveInstanceRegistry>,
    scheduler: Arc<Scheduler>,
    entities: Arc<dyn EntityDirectory>,
    permissions: Arc<dyn PermissionProvider>,
    protections: Vec<Arc<dyn WorldProtection>>,
    perks: Arc<PerkTable>,
    houses: Arc<HouseBook>,
    interceptors: InterceptorRegistry,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl SpellEngine {
    pub(crate) fn new(parts: EngineParts) -> Self {
        Self {
            spells: parts.spells,
            casters: parts.casters,
            instances: parts.instances,
            scheduler: parts.scheduler,
            entities: parts.entities,
            permissions: parts.permissions,
            protections: parts.protections,
            perks: parts.perks,
            houses: parts.houses,
            interceptors: parts.interceptors,
            events: parts.events,
            clock: parts.clock,
        }
    }

    pub fn spells(&self) -> &Arc<SpellRegistry> {
        &self.spells
    }

    pub fn casters(&self) -> &Arc<CasterManager> {
        &self.casters
    }

    pub fn instances(&self) -> &Arc<ActiveInstanceRegistry> {
        &self.instances
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn perks(&self) -> &PerkTable {
        &self.perks
    }

    pub fn houses(&self) -> &HouseBook {
        &self.houses
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// Attempts a cast and reports the outcome.
    ///
    /// Unknown spells, offline casters and casters with another cast in flight
    /// all yield [`CastOutcome::Failure`] without side effects.
    pub fn cast_spell(&self, caster: EntityId, spell_name: &str) -> CastOutcome {
        let Some(spell) = self.spells.get(spell_name) else {
            debug!(target: "spell_runtime::engine", %caster, spell = spell_name, "unknown spell");
            return CastOutcome::Failure;
        };
        let definition = Arc::clone(spell.definition());

        let Some(origin) = self.entities.locate(caster) else {
            debug!(target: "spell_runtime::engine", %caster, spell = definition.name(), "caster offline");
            return self.rejected(caster, &definition, CastOutcome::Failure);
        };

        let entry = self.casters.get_or_load(caster);
        let Some(_gate) = entry.try_begin_cast() else {
            debug!(target: "spell_runtime::engine", %caster, spell = definition.name(), "cast already in flight");
            return self.rejected(caster, &definition, CastOutcome::Failure);
        };

        let now = self.clock.now_ms();
        let snapshot = entry.snapshot();

        let effective = match self.admit(&snapshot, &spell, now) {
            Ok(effective) => effective,
            Err(outcome) => return self.rejected(caster, &definition, outcome),
        };

        let mut pre_cast = PreCast::new(&snapshot, &definition, effective.magic_cost);
        self.interceptors.run(&mut pre_cast);
        if pre_cast.is_cancelled() {
            return self.rejected(caster, &definition, CastOutcome::Cancelled);
        }
        let magic_cost = pre_cast.magic_cost();
        if !snapshot.has_magic(magic_cost) {
            return self.rejected(caster, &definition, CastOutcome::InsufficientMagic);
        }

        let ctx = CastContext::new(
            caster,
            origin,
            &definition,
            magic_cost,
            now,
            &self.scheduler,
            self.entities.as_ref(),
        );
        let executed = scheduler::guarded(|| {
            let mut instance = spell.behavior().begin(&ctx);
            let outcome = instance.execute(&ctx);
            (instance, outcome)
        });
        let (instance, outcome) = match executed {
            Ok(executed) => executed,
            Err(error) => {
                warn!(
                    target: "spell_runtime::engine",
                    %caster,
                    spell = definition.name(),
                    %error,
                    "spell execution failed"
                );
                return self.rejected(caster, &definition, CastOutcome::Failure);
            }
        };
        if !outcome.is_success() {
            return self.rejected(caster, &definition, outcome);
        }

        {
            let mut state = entry.lock();
            state.consume_magic(magic_cost);
            if let Some(cooldown) = effective.cooldown_ms {
                state.set_cooldown(definition.key(), cooldown, now);
            }
        }

        if instance.needs_ticking() {
            self.instances.track(TrackRequest {
                definition: Arc::clone(&definition),
                caster: Arc::clone(&entry),
                cooldown_ms: effective.cooldown_ms,
                behavior: instance,
                origin,
            });
        }

        info!(
            target: "spell_runtime::engine",
            %caster,
            spell = definition.name(),
            magic_spent = ?magic_cost,
            "spell cast"
        );
        self.events.publish(Event::Cast(CastEvent::Succeeded {
            caster,
            spell: definition.name().to_owned(),
            magic_spent: magic_cost,
        }));
        CastOutcome::Success
    }

    fn admit(&self, caster: &Caster, spell: &RegisteredSpell, now: u64) -> std::result::Result<Effective, CastOutcome> {
        let definition = spell.definition();

        if !definition.is_enabled() || !spell.behavior().can_cast(caster) {
            return Err(CastOutcome::Failure);
        }

        let id = caster.id();
        if !self.permissions.has_permission(id, &definition.permission_key()) {
            return Err(CastOutcome::NoPermission);
        }
        if let Some(key) = definition.element_permission_key()
            && !self.permissions.has_permission(id, &key)
        {
            return Err(CastOutcome::NoPermission);
        }

        if caster.is_on_cooldown(definition.key(), now) {
            return Err(CastOutcome::OnCooldown);
        }
        let effective = self.effective(caster, definition);
        if !caster.has_magic(effective.magic_cost) {
            return Err(CastOutcome::InsufficientMagic);
        }
        Ok(effective)
    }

    fn effective(&self, caster: &Caster, definition: &SpellDefinition) -> Effective {
        let house = caster.house();
        let element = definition.element();
        Effective {
            magic_cost: self
                .perks
                .modify_magic_cost(definition.magic_cost(), house, element),
            cooldown_ms: self
                .perks
                .modify_cooldown(definition.cooldown_ms(), house, element),
        }
    }

    fn rejected(&self, caster: EntityId, definition: &SpellDefinition, outcome: CastOutcome) -> CastOutcome {
        debug!(
            target: "spell_runtime::engine",
            %caster,
            spell = definition.name(),
            %outcome,
            "cast rejected"
        );
        self.events.publish(Event::Cast(CastEvent::Failed {
            caster,
            spell: definition.name().to_owned(),
            outcome,
        }));
        outcome
    }

    /// Definition bound at `slot`, if any.
    pub fn get_spell_at_slot(&self, caster: EntityId, slot: usize) -> Option<Arc<SpellDefinition>> {
        let key = self.casters.get_or_load(caster).lock().slots().get(slot).cloned()?;
        self.spells.get_key(&key).map(|spell| Arc::clone(spell.definition()))
    }

    /// Binds a spell to a slot, returning the key previously bound there.
    pub fn bind_spell(
        &self,
        caster: EntityId,
        slot: usize,
        spell_name: &str,
    ) -> std::result::Result<Option<SpellKey>, SlotError> {
        let spell = self
            .spells
            .get(spell_name)
            .ok_or_else(|| SlotError::UnknownSpell(spell_name.to_owned()))?;
        let definition = spell.definition();

        let entry = self.casters.get_or_load(caster);
        let mut state = entry.lock();
        if !self.houses.can_use(state.house(), definition.element()) {
            return Err(SlotError::HouseRestricted {
                house: state.house().unwrap_or_default().to_owned(),
                spell: definition.name().to_owned(),
            });
        }
        state.slots_mut().bind(slot, definition.key().clone())
    }

    pub fn unbind_spell(
        &self,
        caster: EntityId,
        slot: usize,
    ) -> std::result::Result<Option<SpellKey>, SlotError> {
        self.casters.get_or_load(caster).lock().slots_mut().unbind(slot)
    }

    pub fn is_on_cooldown(&self, caster: EntityId, spell_name: &str) -> bool {
        let now = self.clock.now_ms();
        self.casters
            .get_or_load(caster)
            .lock()
            .is_on_cooldown(&SpellKey::new(spell_name), now)
    }

    /// Milliseconds left on a cooldown, or `None` when it has expired.
    pub fn cooldown_remaining(&self, caster: EntityId, spell_name: &str) -> Option<u64> {
        let now = self.clock.now_ms();
        self.casters
            .get_or_load(caster)
            .lock()
            .cooldowns()
            .remaining_ms(&SpellKey::new(spell_name), now)
    }

    pub fn get_magic(&self, caster: EntityId) -> u32 {
        self.casters.get_or_load(caster).lock().magic().current()
    }

    /// Moves a caster into `house` (or out of any house) and drops binds the
    /// new house may not use. Returns the cleared slots.
    pub fn set_house(&self, caster: EntityId, house: Option<&str>) -> Result<Vec<usize>> {
        let house = match house {
            Some(name) => Some(self.houses.require(name)?.name.to_lowercase()),
            None => None,
        };

        let entry = self.casters.get_or_load(caster);
        let mut state = entry.lock();
        state.set_house(house.clone());

        let spells = &self.spells;
        let houses = &self.houses;
        let cleared = state.slots_mut().unbind_where(|key| {
            spells
                .get_key(key)
                .is_some_and(|spell| !houses.can_use(house.as_deref(), spell.definition().element()))
        });
        debug!(
            target: "spell_runtime::engine",
            %caster,
            house = house.as_deref().unwrap_or("-"),
            cleared = cleared.len(),
            "house changed"
        );
        Ok(cleared)
    }

    /// Loads a caster that just came online.
    pub fn connect(&self, caster: EntityId) {
        self.casters.get_or_load(caster);
    }

    /// Stops the caster's instances, saves the caster and drops it from memory.
    pub fn disconnect(&self, caster: EntityId) -> bool {
        let stopped = self.instances.stop_caster(caster, StopReason::CasterOffline);
        let unloaded = self.casters.disconnect(caster).is_some();
        debug!(target: "spell_runtime::engine", %caster, stopped, "caster disconnected");
        unloaded
    }

    /// Stops one instance from outside.
    pub fn force_stop(&self, instance: InstanceId) -> bool {
        self.instances
            .get(instance)
            .is_some_and(|instance| instance.remove(StopReason::Forced))
    }

    /// Unregisters a spell after stopping every running instance of it.
    pub fn unregister_spell(&self, spell_name: &str) -> Option<RegisteredSpell> {
        let key = SpellKey::new(spell_name);
        let stopped = self.instances.stop_spell(&key, StopReason::Forced);
        let removed = self.spells.unregister(spell_name)?;
        if stopped > 0 {
            info!(
                target: "spell_runtime::engine",
                spell = removed.definition().name(),
                stopped,
                "stopped instances of unregistered spell"
            );
        }
        Some(removed)
    }

    pub fn active_instances(&self) -> Vec<Arc<ActiveSpell>> {
        self.instances.snapshot()
    }
}
