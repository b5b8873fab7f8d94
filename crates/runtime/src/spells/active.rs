//! Tracking and ticking of running spell instances.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError, Weak};

use spell_core::{EntityId, Location, SpellDefinition, SpellKey};
use tracing::{debug, trace, warn};

use super::{Progress, SpellInstance, StopReason, TickContext};
use crate::casters::CasterEntry;
use crate::clock::Clock;
use crate::events::{Event, EventBus, InstanceId, SpellEvent};
use crate::scheduler::{self, Affinity, Schedule, Scheduler, Target, TaskHandle, TaskResult};
use crate::world::EntityDirectory;

/// Everything needed to start tracking a freshly executed instance.
pub struct TrackRequest {
    pub definition: Arc<SpellDefinition>,
    pub caster: Arc<CasterEntry>,
    /// Effective cooldown, written to the caster's ledger when the instance stops.
    pub cooldown_ms: Option<u64>,
    pub behavior: Box<dyn SpellInstance>,
    /// Where the cast happened; the anchor when the instance reports no location.
    pub origin: Location,
}

struct Shared {
    instances: RwLock<HashMap<InstanceId, Arc<ActiveSpell>>>,
    next_id: AtomicU64,
    scheduler: Arc<Scheduler>,
    entities: Arc<dyn EntityDirectory>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    rebind: bool,
}

/// A running spell instance.
pub struct ActiveSpell {
    id: InstanceId,
    definition: Arc<SpellDefinition>,
    caster_id: EntityId,
    caster: Weak<CasterEntry>,
    cooldown_ms: Option<u64>,
    behavior: Mutex<Box<dyn SpellInstance>>,
    location: Mutex<Location>,
    removed: AtomicBool,
    /// Stop reason whose `on_stop` has not run yet.
    pending_stop: Mutex<Option<StopReason>>,
    ticks: AtomicU64,
    task: Mutex<Option<TaskHandle>>,
    started_at_ms: u64,
    shared: Weak<Shared>,
}

impl ActiveSpell {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn definition(&self) -> &Arc<SpellDefinition> {
        &self.definition
    }

    pub fn caster(&self) -> EntityId {
        self.caster_id
    }

    /// Last known anchor of the instance.
    pub fn location(&self) -> Location {
        *self.location.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of ticks that have reached the instance so far.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn started_at_ms(&self) -> u64 {
        self.started_at_ms
    }

    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// The periodic task currently driving the instance.
    pub fn task(&self) -> Option<TaskHandle> {
        self.task_slot().clone()
    }

    fn task_slot(&self) -> MutexGuard<'_, Option<TaskHandle>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn behavior(&self) -> MutexGuard<'_, Box<dyn SpellInstance>> {
        self.behavior.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stops the instance.
    ///
    /// Only the first call has any effect: it cancels the periodic task, runs
    /// the instance's `on_stop`, writes the caster's cooldown and drops the
    /// instance from the registry. Later calls return `false`.
    ///
    /// When `progress` is running at that moment (including a call made from
    /// inside `progress` itself), `on_stop` is deferred until it returns.
    pub fn remove(&self, reason: StopReason) -> bool {
        if self.removed.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(task) = self.task_slot().take() {
            task.cancel();
        }

        *self.pending_stop.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason);
        match self.behavior.try_lock() {
            Ok(mut behavior) => self.finish_stop(&mut **behavior),
            Err(TryLockError::Poisoned(poisoned)) => self.finish_stop(&mut **poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => trace!(
                target: "spell_runtime::spells",
                instance = %self.id,
                "progress running; on_stop deferred"
            ),
        }

        let Some(shared) = self.shared.upgrade() else {
            return true;
        };
        let now = shared.clock.now_ms();

        if let (Some(cooldown), Some(caster)) = (self.cooldown_ms, self.caster.upgrade()) {
            caster
                .lock()
                .set_cooldown(self.definition.key(), cooldown, now);
        }

        shared
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);

        let alive_ms = now.saturating_sub(self.started_at_ms);
        debug!(
            target: "spell_runtime::spells",
            instance = %self.id,
            caster = %self.caster_id,
            spell = self.definition.name(),
            %reason,
            ticks = self.ticks(),
            alive_ms,
            "instance stopped"
        );
        shared.events.publish(Event::Spell(SpellEvent::Stopped {
            instance: self.id,
            caster: self.caster_id,
            spell: self.definition.name().to_owned(),
            reason,
            alive_ms,
        }));
        true
    }

    fn flush_stop(&self) {
        let pending = self
            .pending_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if pending {
            self.finish_stop(&mut **self.behavior());
        }
    }

    /// Runs the pending `on_stop`, if any. Callers hold the behaviour lock.
    fn finish_stop(&self, behavior: &mut (dyn SpellInstance + 'static)) {
        let Some(reason) = self
            .pending_stop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        if let Err(error) = scheduler::guarded(|| behavior.on_stop(reason)) {
            warn!(
                target: "spell_runtime::spells",
                instance = %self.id,
                spell = self.definition.name(),
                %error,
                "on_stop failed"
            );
        }
    }

    /// One invocation of the periodic progress task.
    fn tick(self: &Arc<Self>) -> TaskResult {
        let Some(shared) = self.shared.upgrade() else {
            return Ok(());
        };
        if self.is_removed() {
            return Ok(());
        }

        let caster_location = match (self.caster.upgrade(), shared.entities.locate(self.caster_id)) {
            (Some(_), Some(location)) => location,
            _ => {
                self.remove(StopReason::CasterOffline);
                return Ok(());
            }
        };

        let tick = self.ticks.fetch_add(1, Ordering::AcqRel) + 1;
        let elapsed_ms = shared.clock.now_ms().saturating_sub(self.started_at_ms);

        let stepped = {
            let mut behavior = self.behavior();
            (!self.is_removed()).then(|| {
                let mut ctx = TickContext::new(
                    tick,
                    self.caster_id,
                    caster_location,
                    &self.definition,
                    elapsed_ms,
                    &shared.scheduler,
                    shared.entities.as_ref(),
                );
                scheduler::guarded(|| {
                    let progress = behavior.progress(&mut ctx);
                    (progress, behavior.location())
                })
            })
        };
        // A `remove` that raced with `progress` left its `on_stop` to us.
        self.flush_stop();
        let Some(stepped) = stepped else {
            return Ok(());
        };

        let (progress, location) = match stepped {
            Ok(stepped) => stepped,
            Err(error) => {
                self.remove(StopReason::Failed);
                return Err(error);
            }
        };

        if let Progress::Stop(reason) = progress {
            self.remove(reason);
            return Ok(());
        }
        if self.is_removed() {
            return Ok(());
        }

        let location = location.unwrap_or(caster_location);
        if let Some(range) = self.definition.range() {
            let within = caster_location
                .distance(&location)
                .is_some_and(|distance| distance <= range);
            if !within {
                self.remove(StopReason::OutOfRange);
                return Ok(());
            }
        }

        *self.location.lock().unwrap_or_else(PoisonError::into_inner) = location;

        if shared.rebind
            && let Some(Target::Domain(next)) = shared.scheduler.resolve(&Affinity::Region(location))
            && Scheduler::current_domain().is_some_and(|current| current != next)
        {
            self.rebind(&shared, location);
        }

        Ok(())
    }

    /// Moves the progress task to the domain now owning `location`.
    fn rebind(self: &Arc<Self>, shared: &Shared, location: Location) {
        let mut task = self.task_slot();
        if self.is_removed() {
            return;
        }

        match spawn_ticker(shared, self, location) {
            Some(next) => {
                trace!(
                    target: "spell_runtime::spells",
                    instance = %self.id,
                    task_id = %next.id(),
                    "instance crossed domains; task rebound"
                );
                if let Some(previous) = task.replace(next) {
                    previous.cancel();
                }
            }
            None => {
                drop(task);
                self.remove(StopReason::Shutdown);
            }
        }
    }
}

impl fmt::Debug for ActiveSpell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSpell")
            .field("id", &self.id)
            .field("spell", &self.definition.name())
            .field("caster", &self.caster_id)
            .field("ticks", &self.ticks())
            .field("removed", &self.is_removed())
            .finish()
    }
}

fn spawn_ticker(shared: &Shared, instance: &Arc<ActiveSpell>, anchor: Location) -> Option<TaskHandle> {
    let label = format!("spell:{}:{}", instance.definition.key(), instance.id.0);
    let ticking = Arc::clone(instance);
    shared.scheduler.schedule(
        Affinity::Region(anchor),
        Schedule::every(1, 1).labeled(label),
        move || ticking.tick(),
    )
}

/// Concurrent set of running instances, each driven by its own periodic task.
pub struct ActiveInstanceRegistry {
    shared: Arc<Shared>,
}

impl ActiveInstanceRegistry {
    pub fn new(
        scheduler: Arc<Scheduler>,
        entities: Arc<dyn EntityDirectory>,
        events: EventBus,
        clock: Arc<dyn Clock>,
        rebind: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                instances: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                scheduler,
                entities,
                events,
                clock,
                rebind,
            }),
        }
    }

    /// Starts tracking an instance and schedules its progress task one tick
    /// from now, anchored at the instance's location.
    ///
    /// Returns `None` when the scheduler declines the task (shutdown); the
    /// instance is then stopped immediately.
    pub fn track(&self, request: TrackRequest) -> Option<Arc<ActiveSpell>> {
        let shared = &self.shared;
        let id = InstanceId(shared.next_id.fetch_add(1, Ordering::AcqRel) + 1);
        let anchor = request.behavior.location().unwrap_or(request.origin);

        let instance = Arc::new(ActiveSpell {
            id,
            caster_id: request.caster.id(),
            caster: Arc::downgrade(&request.caster),
            definition: request.definition,
            cooldown_ms: request.cooldown_ms,
            behavior: Mutex::new(request.behavior),
            location: Mutex::new(anchor),
            removed: AtomicBool::new(false),
            pending_stop: Mutex::new(None),
            ticks: AtomicU64::new(0),
            task: Mutex::new(None),
            started_at_ms: shared.clock.now_ms(),
            shared: Arc::downgrade(shared),
        });

        shared
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&instance));
        shared.events.publish(Event::Spell(SpellEvent::Started {
            instance: id,
            caster: instance.caster_id,
            spell: instance.definition.name().to_owned(),
        }));

        let Some(handle) = spawn_ticker(shared, &instance, anchor) else {
            instance.remove(StopReason::Shutdown);
            return None;
        };

        {
            let mut task = instance.task_slot();
            if instance.is_removed() || task.is_some() {
                handle.cancel();
            } else {
                *task = Some(handle);
            }
        }

        debug!(
            target: "spell_runtime::spells",
            instance = %id,
            caster = %instance.caster_id,
            spell = instance.definition.name(),
            "instance started"
        );
        Some(instance)
    }

    pub fn get(&self, id: InstanceId) -> Option<Arc<ActiveSpell>> {
        self.shared
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Every running instance, ordered by id.
    pub fn snapshot(&self) -> Vec<Arc<ActiveSpell>> {
        let mut instances: Vec<_> = self
            .shared
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        instances.sort_by_key(|instance| instance.id);
        instances
    }

    pub fn len(&self) -> usize {
        self.shared
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stops every instance matching `predicate`. Returns how many stopped.
    pub fn stop_where(&self, reason: StopReason, predicate: impl Fn(&ActiveSpell) -> bool) -> usize {
        let matching: Vec<_> = self
            .snapshot()
            .into_iter()
            .filter(|instance| predicate(instance))
            .collect();
        matching
            .iter()
            .filter(|instance| instance.remove(reason))
            .count()
    }

    pub fn stop_all(&self, reason: StopReason) -> usize {
        self.stop_where(reason, |_| true)
    }

    pub fn stop_caster(&self, caster: EntityId, reason: StopReason) -> usize {
        self.stop_where(reason, |instance| instance.caster_id == caster)
    }

    pub fn stop_spell(&self, spell: &SpellKey, reason: StopReason) -> usize {
        self.stop_where(reason, |instance| instance.definition.key() == spell)
    }
}
