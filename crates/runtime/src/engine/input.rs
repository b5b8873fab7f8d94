//! Input dispatch: turns slot presses into casts.

use serde::{Deserialize, Serialize};
use spell_core::{ActivationTrigger, CastOutcome, EntityId};
use tracing::trace;

use super::SpellEngine;

/// Raw input from the caster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputAction {
    LeftClick,
    RightClick,
    SneakStart,
}

impl InputAction {
    /// Whether this input starts spells with `trigger`.
    pub fn triggers(self, trigger: ActivationTrigger) -> bool {
        matches!(
            (self, trigger),
            (Self::LeftClick, ActivationTrigger::LeftClick)
                | (Self::RightClick, ActivationTrigger::RightClick)
                | (Self::SneakStart, ActivationTrigger::Sneak)
        )
    }
}

/// Why the input layer refused to cast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
    /// The caster's house may not use the spell's element.
    HouseRestricted,
    /// A world protection forbids casting at the caster's location.
    Protected { by: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputResult {
    /// Nothing is bound at the slot.
    NoSpell,
    /// The bound spell starts on a different input.
    TriggerMismatch,
    Denied(Denial),
    Cast(CastOutcome),
}

/// What a caster sees when inspecting a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotInfo {
    pub name: String,
    pub description: String,
    pub instructions: String,
    /// Effective magic cost after perks.
    pub magic_cost: Option<u32>,
    /// Effective cooldown after perks, in seconds.
    pub cooldown_secs: Option<f64>,
}

impl SpellEngine {
    /// Casts whatever is bound at `slot` if `action` is its trigger.
    pub fn handle_input(&self, caster: EntityId, slot: usize, action: InputAction) -> InputResult {
        let Some(definition) = self.get_spell_at_slot(caster, slot) else {
            return InputResult::NoSpell;
        };
        if !action.triggers(definition.trigger()) {
            trace!(
                target: "spell_runtime::engine",
                %caster,
                spell = definition.name(),
                %action,
                "input does not trigger spell"
            );
            return InputResult::TriggerMismatch;
        }

        let house = self.casters.get_or_load(caster).lock().house().map(str::to_owned);
        if !self.houses.can_use(house.as_deref(), definition.element()) {
            return InputResult::Denied(Denial::HouseRestricted);
        }

        if let Some(location) = self.entities.locate(caster)
            && let Some(protection) = self
                .protections
                .iter()
                .find(|protection| !protection.can_cast_here(caster, &location))
        {
            trace!(
                target: "spell_runtime::engine",
                %caster,
                spell = definition.name(),
                protection = protection.name(),
                "cast blocked by protection"
            );
            return InputResult::Denied(Denial::Protected {
                by: protection.name().to_owned(),
            });
        }

        InputResult::Cast(self.cast_spell(caster, definition.name()))
    }

    /// Describes the spell bound at `slot`, with costs adjusted for the caster.
    pub fn describe_slot(&self, caster: EntityId, slot: usize) -> Option<SlotInfo> {
        let definition = self.get_spell_at_slot(caster, slot)?;
        let snapshot = self.casters.get_or_load(caster).snapshot();
        let effective = self.effective(&snapshot, &definition);

        Some(SlotInfo {
            name: definition.name().to_owned(),
            description: definition.description().to_owned(),
            instructions: definition.instructions().to_owned(),
            magic_cost: effective.magic_cost,
            cooldown_secs: effective.cooldown_ms.map(|ms| ms as f64 / 1000.0),
        })
    }
}
