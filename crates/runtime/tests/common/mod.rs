#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use spell_core::{CastOutcome, EntityId, Location, SpellDefinition, WorldId};
use spell_runtime::{
    CastContext, EntityTable, InMemoryCasterRepo, ManualClock, PermissionTable, Progress, Runtime,
    RuntimeBuilder, RuntimeConfig, Spell, SpellEngine, SpellInstance, SpellRegistry, StopReason,
    TickContext,
};

pub const START_MS: u64 = 1_000_000;

pub fn spawn_point() -> Location {
    Location::new(WorldId(0), 0.0, 64.0, 0.0)
}

pub fn spell(
    definition: SpellDefinition,
    behavior: Arc<dyn Spell>,
) -> (SpellDefinition, Arc<dyn Spell>) {
    (definition, behavior)
}

/// A runtime with in-memory collaborators the test can poke at.
pub struct Harness {
    pub runtime: Runtime,
    pub engine: Arc<SpellEngine>,
    pub entities: Arc<EntityTable>,
    pub permissions: Arc<PermissionTable>,
    pub clock: Arc<ManualClock>,
    pub repo: Arc<InMemoryCasterRepo>,
}

impl Harness {
    pub async fn start(spells: Vec<(SpellDefinition, Arc<dyn Spell>)>) -> Self {
        Self::start_with(RuntimeConfig::default(), spells, |builder| builder).await
    }

    pub async fn start_with(
        config: RuntimeConfig,
        spells: Vec<(SpellDefinition, Arc<dyn Spell>)>,
        customize: impl FnOnce(RuntimeBuilder) -> RuntimeBuilder,
    ) -> Self {
        let registry = Arc::new(SpellRegistry::new());
        for (definition, behavior) in spells {
            registry.register(definition, behavior);
        }

        let entities = Arc::new(EntityTable::new());
        let permissions = Arc::new(PermissionTable::new());
        let clock = Arc::new(ManualClock::new(START_MS));
        let repo = Arc::new(InMemoryCasterRepo::new());

        let builder = Runtime::builder()
            .config(config)
            .spells(registry)
            .entities(entities.clone())
            .permissions(permissions.clone())
            .clock(clock.clone())
            .repository(repo.clone());
        let runtime = customize(builder).build().await.expect("runtime builds");

        Self {
            engine: runtime.engine(),
            runtime,
            entities,
            permissions,
            clock,
            repo,
        }
    }

    /// Brings a caster online at the spawn point with `magic` in the pool.
    pub fn online(&self, id: EntityId, magic: u32) {
        self.entities.place(id, spawn_point());
        self.engine
            .casters()
            .get_or_load(id)
            .lock()
            .magic_mut()
            .set(magic);
    }

    pub fn tick(&self) -> Duration {
        self.runtime.config().tick
    }

    /// Lets `ticks` scheduling units elapse (tokio time must be paused).
    pub async fn advance_ticks(&self, ticks: u32) {
        tokio::time::sleep(self.tick() * ticks).await;
    }
}

/// Spell whose `execute` returns a fixed outcome and never ticks.
pub struct OneShot {
    pub outcome: CastOutcome,
    pub executions: Arc<AtomicUsize>,
}

impl OneShot {
    pub fn new(outcome: CastOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            executions: Arc::new(AtomicUsize::new(0)),
        })
    }
}

struct OneShotInstance {
    outcome: CastOutcome,
    executions: Arc<AtomicUsize>,
}

impl SpellInstance for OneShotInstance {
    fn execute(&mut self, _ctx: &CastContext<'_>) -> CastOutcome {
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.outcome
    }

    fn needs_ticking(&self) -> bool {
        false
    }
}

impl Spell for OneShot {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(OneShotInstance {
            outcome: self.outcome,
            executions: Arc::clone(&self.executions),
        })
    }
}

/// Counters shared between a ticking spell and the test.
#[derive(Clone, Default)]
pub struct TickProbe {
    pub ticks: Arc<AtomicU64>,
    pub stops: Arc<AtomicUsize>,
    pub reasons: Arc<Mutex<Vec<StopReason>>>,
}

impl TickProbe {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn reasons(&self) -> Vec<StopReason> {
        self.reasons.lock().unwrap().clone()
    }
}

/// Spell that ticks until `stop_at`, optionally drifting away from its caster.
pub struct Ticking {
    pub probe: TickProbe,
    pub stop_at: u64,
    /// Blocks moved along +x per tick.
    pub drift: f64,
}

impl Ticking {
    pub fn new(stop_at: u64) -> (Arc<Self>, TickProbe) {
        Self::drifting(stop_at, 0.0)
    }

    pub fn drifting(stop_at: u64, drift: f64) -> (Arc<Self>, TickProbe) {
        let probe = TickProbe::default();
        let spell = Arc::new(Self {
            probe: probe.clone(),
            stop_at,
            drift,
        });
        (spell, probe)
    }
}

struct TickingInstance {
    probe: TickProbe,
    stop_at: u64,
    drift: f64,
    position: Option<Location>,
}

impl SpellInstance for TickingInstance {
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome {
        if self.drift != 0.0 {
            self.position = Some(ctx.origin);
        }
        CastOutcome::Success
    }

    fn progress(&mut self, ctx: &mut TickContext<'_>) -> Progress {
        self.probe.ticks.fetch_add(1, Ordering::SeqCst);
        if let Some(position) = self.position.as_mut() {
            *position = position.offset(self.drift, 0.0, 0.0);
        }
        if ctx.tick >= self.stop_at {
            Progress::Stop(StopReason::Finished)
        } else {
            Progress::Continue
        }
    }

    fn on_stop(&mut self, reason: StopReason) {
        self.probe.stops.fetch_add(1, Ordering::SeqCst);
        self.probe.reasons.lock().unwrap().push(reason);
    }

    fn location(&self) -> Option<Location> {
        self.position
    }
}

impl Spell for Ticking {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(TickingInstance {
            probe: self.probe.clone(),
            stop_at: self.stop_at,
            drift: self.drift,
            position: None,
        })
    }
}

/// Spell whose `execute` panics.
pub struct Exploding;

struct ExplodingInstance;

impl SpellInstance for ExplodingInstance {
    fn execute(&mut self, _ctx: &CastContext<'_>) -> CastOutcome {
        panic!("spell blew up");
    }
}

impl Spell for Exploding {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(ExplodingInstance)
    }
}

/// In-memory log sink for asserting on `tracing` output.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
