//! Scripted casters that wander and press slots on a fixed cadence.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use spell_core::{ActivationTrigger, EntityId, Location, SLOT_COUNT, WorldId};
use spell_runtime::{
    Affinity, EntityDirectory, EntityTable, InputAction, InputResult, Runtime, SpellEngine,
    TaskHandle,
};
use tracing::{debug, info, warn};

/// Ticks between two simulation rounds.
const ROUND_TICKS: u64 = 20;
/// Blocks every caster walks along +x per round.
const STRIDE: f64 = 3.0;

/// Handle to the running simulation.
pub struct Simulation {
    task: TaskHandle,
    casters: Vec<EntityId>,
    engine: Arc<SpellEngine>,
}

impl Simulation {
    /// Brings `count` casters online, binds the catalog onto their slots and
    /// starts the round timer.
    pub fn start(runtime: &Runtime, entities: Arc<EntityTable>, count: u64) -> Result<Self> {
        let engine = runtime.engine();
        let catalog = engine.spells().all();
        let mut houses: Vec<String> = engine.houses().iter().map(|house| house.name.clone()).collect();
        houses.sort();

        let casters: Vec<EntityId> = (1..=count).map(EntityId).collect();
        for (index, &caster) in casters.iter().enumerate() {
            let spawn = Location::new(WorldId(0), index as f64 * 40.0, 64.0, 0.0);
            entities.place(caster, spawn);
            engine.connect(caster);

            // Every other caster joins a house, round-robin.
            if index % 2 == 1
                && let Some(house) = houses.get((index / 2) % houses.len().max(1))
            {
                engine.set_house(caster, Some(house.as_str()))?;
            }

            for (slot, definition) in catalog.iter().take(SLOT_COUNT).enumerate() {
                if let Err(error) = engine.bind_spell(caster, slot, definition.name()) {
                    debug!(
                        target: "spell_server::simulation",
                        %caster,
                        slot,
                        %error,
                        "slot left empty"
                    );
                }
            }
        }

        let round_engine = Arc::clone(&engine);
        let round_casters = casters.clone();
        let mut round = 0u64;
        let task = runtime
            .scheduler()
            .run_timer(Affinity::Global, ROUND_TICKS, ROUND_TICKS, move || {
                round += 1;
                play_round(&round_engine, &entities, &round_casters, round);
                Ok(())
            })
            .ok_or_else(|| anyhow!("simulation timer was not scheduled"))?;

        info!(
            target: "spell_server::simulation",
            casters = casters.len(),
            spells = catalog.len(),
            "simulation started"
        );
        Ok(Self {
            task,
            casters,
            engine,
        })
    }

    /// Cancels the round timer and disconnects every simulated caster.
    pub fn stop(&self) {
        self.task.cancel();
        for &caster in &self.casters {
            self.engine.disconnect(caster);
        }
        info!(target: "spell_server::simulation", "simulation stopped");
    }
}

fn play_round(engine: &SpellEngine, entities: &EntityTable, casters: &[EntityId], round: u64) {
    for &caster in casters {
        if let Some(location) = entities.locate(caster) {
            entities.place(caster, location.offset(STRIDE, 0.0, 0.0));
        }

        let slot = ((round + caster.0) as usize) % SLOT_COUNT;
        let Some(definition) = engine.get_spell_at_slot(caster, slot) else {
            continue;
        };
        let action = match definition.trigger() {
            ActivationTrigger::LeftClick => InputAction::LeftClick,
            ActivationTrigger::RightClick => InputAction::RightClick,
            ActivationTrigger::Sneak => InputAction::SneakStart,
        };

        match engine.handle_input(caster, slot, action) {
            InputResult::Cast(outcome) => debug!(
                target: "spell_server::simulation",
                %caster,
                spell = definition.name(),
                %outcome,
                magic = engine.get_magic(caster),
                "input handled"
            ),
            InputResult::Denied(denial) => warn!(
                target: "spell_server::simulation",
                %caster,
                spell = definition.name(),
                ?denial,
                "input denied"
            ),
            InputResult::NoSpell | InputResult::TriggerMismatch => {}
        }
    }
}
