mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use common::{Harness, START_MS, TickProbe, Ticking, spell};
use spell_core::{ActivationTrigger, CastOutcome, EntityId, SpellCategory, SpellDefinition, SpellKey};
use spell_runtime::{
    BackendKind, CastContext, CasterRepository, Event, Progress, RuntimeConfig, Spell,
    SpellEngine, SpellEvent, SpellInstance, StopReason, TickContext, Topic,
};

const CASTER: EntityId = EntityId(3);

fn beam() -> SpellDefinition {
    SpellDefinition::new("Beam", SpellCategory::Elemental)
        .with_magic_cost(10)
        .with_cooldown_ms(5_000)
        .with_trigger(ActivationTrigger::Sneak)
}

#[tokio::test(start_paused = true)]
async fn instance_stopping_on_tick_40_never_ticks_again() {
    let (behavior, probe) = Ticking::new(40);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    let mut spells = h.runtime.subscribe(Topic::Spell);
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    let instance = h.engine.active_instances().pop().expect("tracked");
    let task = instance.task().expect("ticking");

    h.advance_ticks(120).await;

    assert_eq!(probe.ticks(), 40);
    assert_eq!(instance.ticks(), 40);
    assert_eq!(probe.reasons(), [StopReason::Finished]);
    assert!(instance.is_removed());
    assert!(task.is_cancelled());
    assert!(h.engine.active_instances().is_empty());
    assert!(h.runtime.scheduler().registry().lookup(task.id()).is_none());

    assert!(matches!(
        spells.try_recv().unwrap(),
        Event::Spell(SpellEvent::Started { caster: CASTER, .. })
    ));
    assert!(matches!(
        spells.try_recv().unwrap(),
        Event::Spell(SpellEvent::Stopped {
            reason: StopReason::Finished,
            ..
        })
    ));
}

#[tokio::test]
async fn remove_is_idempotent() {
    let (behavior, probe) = Ticking::new(u64::MAX);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    let instance = h.engine.active_instances().pop().expect("tracked");
    let task = instance.task().expect("ticking");
    let key = SpellKey::new("beam");
    let expiry = || {
        h.engine
            .casters()
            .get_or_load(CASTER)
            .lock()
            .cooldowns()
            .expiry(&key)
    };

    h.clock.advance(Duration::from_secs(2));
    assert!(instance.remove(StopReason::Forced));
    assert_eq!(expiry(), Some(START_MS + 7_000));

    h.clock.advance(Duration::from_secs(3));
    assert!(!instance.remove(StopReason::Forced));
    assert!(!h.engine.force_stop(instance.id()));

    assert_eq!(expiry(), Some(START_MS + 7_000));
    assert_eq!(probe.stops(), 1);
    assert!(task.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn caster_going_offline_stops_its_instances() {
    let (behavior, probe) = Ticking::new(u64::MAX);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    h.advance_ticks(3).await;
    assert!(probe.ticks() >= 1);

    h.entities.remove(CASTER);
    h.advance_ticks(3).await;
    let ticks = probe.ticks();

    assert_eq!(probe.reasons(), [StopReason::CasterOffline]);
    assert!(h.engine.active_instances().is_empty());

    h.advance_ticks(10).await;
    assert_eq!(probe.ticks(), ticks);
}

#[tokio::test(start_paused = true)]
async fn drifting_past_the_range_stops_the_instance() {
    let (behavior, probe) = Ticking::drifting(u64::MAX, 1.0);
    let h = Harness::start(vec![spell(beam().with_range(5.0), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    h.advance_ticks(30).await;

    assert_eq!(probe.ticks(), 6);
    assert_eq!(probe.reasons(), [StopReason::OutOfRange]);
}

#[tokio::test]
async fn disconnect_stops_instances_and_saves() {
    let (behavior, probe) = Ticking::new(u64::MAX);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    assert!(h.engine.disconnect(CASTER));

    assert_eq!(probe.reasons(), [StopReason::CasterOffline]);
    assert!(h.engine.casters().get_if_loaded(CASTER).is_none());
    let record = h.repo.load(CASTER).unwrap().expect("saved on disconnect");
    assert_eq!(record.magic, 90);
}

/// Ticks until `leave_at`, then disconnects its own caster from inside `progress`.
struct Walkout {
    engine: Arc<OnceLock<Arc<SpellEngine>>>,
    probe: TickProbe,
    leave_at: u64,
}

struct WalkoutInstance {
    engine: Arc<OnceLock<Arc<SpellEngine>>>,
    probe: TickProbe,
    leave_at: u64,
}

impl SpellInstance for WalkoutInstance {
    fn execute(&mut self, _ctx: &CastContext<'_>) -> CastOutcome {
        CastOutcome::Success
    }

    fn progress(&mut self, ctx: &mut TickContext<'_>) -> Progress {
        self.probe.ticks.fetch_add(1, Ordering::SeqCst);
        if ctx.tick == self.leave_at
            && let Some(engine) = self.engine.get()
        {
            engine.disconnect(ctx.caster);
        }
        Progress::Continue
    }

    fn on_stop(&mut self, reason: StopReason) {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.probe.reasons.lock().unwrap().push(reason);
    }
}

impl Spell for Walkout {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(WalkoutInstance {
            engine: Arc::clone(&self.engine),
            probe: self.probe.clone(),
            leave_at: self.leave_at,
        })
    }
}

#[tokio::test(start_paused = true)]
async fn instance_disconnecting_its_own_caster_mid_tick_stops_once() {
    let engine = Arc::new(OnceLock::new());
    let probe = TickProbe::default();
    let behavior = Arc::new(Walkout {
        engine: Arc::clone(&engine),
        probe: probe.clone(),
        leave_at: 3,
    });
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    let _ = engine.set(Arc::clone(&h.engine));
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    let instance = h.engine.active_instances().pop().expect("tracked");

    h.advance_ticks(10).await;

    assert_eq!(probe.ticks(), 3);
    assert_eq!(probe.stops(), 1);
    assert_eq!(probe.reasons(), [StopReason::CasterOffline]);
    assert!(instance.is_removed());
    assert!(h.engine.active_instances().is_empty());
    assert!(h.engine.casters().get_if_loaded(CASTER).is_none());
}

#[tokio::test]
async fn unregistering_a_spell_force_stops_it() {
    let (behavior, probe) = Ticking::new(u64::MAX);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    assert!(h.engine.unregister_spell("BEAM").is_some());

    assert_eq!(probe.reasons(), [StopReason::Forced]);
    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Failure);
}

#[tokio::test(start_paused = true)]
async fn moving_instance_follows_its_region_onto_another_domain() {
    let config = RuntimeConfig {
        backend: BackendKind::regional(4),
        ..RuntimeConfig::default()
    };
    let (behavior, probe) = Ticking::drifting(u64::MAX, 20.0);
    let h = Harness::start_with(config, vec![spell(beam(), behavior)], |b| b).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    let instance = h.engine.active_instances().pop().expect("tracked");
    let first = instance.task().expect("ticking");

    h.advance_ticks(20).await;

    let current = instance.task().expect("still ticking");
    assert_ne!(current.id(), first.id());
    assert!(first.is_cancelled());
    assert!(!instance.is_removed());
    assert!(probe.ticks() >= 10);
}

#[tokio::test(start_paused = true)]
async fn without_rebinding_the_task_keeps_its_domain() {
    let config = RuntimeConfig {
        backend: BackendKind::regional(4),
        rebind_moving_instances: false,
        ..RuntimeConfig::default()
    };
    let (behavior, probe) = Ticking::drifting(u64::MAX, 20.0);
    let h = Harness::start_with(config, vec![spell(beam(), behavior)], |b| b).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    let instance = h.engine.active_instances().pop().expect("tracked");
    let first = instance.task().expect("ticking");

    h.advance_ticks(20).await;

    assert_eq!(instance.task().map(|task| task.id()), Some(first.id()));
    assert!(probe.ticks() >= 18);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_instances_saves_and_runs_later_work_inline() {
    let (behavior, probe) = Ticking::new(u64::MAX);
    let h = Harness::start(vec![spell(beam(), behavior)]).await;
    h.online(CASTER, 100);

    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    h.advance_ticks(2).await;

    h.runtime.shutdown().await.expect("clean shutdown");

    assert_eq!(probe.reasons(), [StopReason::Shutdown]);
    assert!(h.engine.active_instances().is_empty());
    assert_eq!(h.repo.load(CASTER).unwrap().map(|r| r.magic), Some(90));

    let scheduler = h.runtime.scheduler();
    assert!(scheduler.is_shutting_down());
    assert!(scheduler.registry().is_empty());

    // Later casts still resolve, but ticking instances can no longer be scheduled.
    h.clock.advance(Duration::from_secs(10));
    assert_eq!(h.engine.cast_spell(CASTER, "beam"), CastOutcome::Success);
    assert!(h.engine.active_instances().is_empty());
    assert_eq!(probe.reasons(), [StopReason::Shutdown, StopReason::Shutdown]);
}
