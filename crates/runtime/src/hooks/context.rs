use spell_core::{Caster, SpellDefinition};

/// A cast that passed admission and is about to execute.
pub struct PreCast<'a> {
    caster: &'a Caster,
    definition: &'a SpellDefinition,
    magic_cost: Option<u32>,
    cancelled: bool,
}

impl<'a> PreCast<'a> {
    pub(crate) fn new(caster: &'a Caster, definition: &'a SpellDefinition, magic_cost: Option<u32>) -> Self {
        Self {
            caster,
            definition,
            magic_cost,
            cancelled: false,
        }
    }

    pub fn caster(&self) -> &Caster {
        self.caster
    }

    pub fn definition(&self) -> &SpellDefinition {
        self.definition
    }

    /// Effective cost so far. `None` means the spell is free.
    pub fn magic_cost(&self) -> Option<u32> {
        self.magic_cost
    }

    pub fn set_magic_cost(&mut self, cost: u32) {
        self.magic_cost = Some(cost);
    }

    /// Adds `delta` to the cost, clamping at zero.
    pub fn adjust_magic_cost(&mut self, delta: i64) {
        let current = i64::from(self.magic_cost.unwrap_or(0));
        let adjusted = (current + delta).clamp(0, i64::from(u32::MAX));
        self.magic_cost = Some(u32::try_from(adjusted).unwrap_or(u32::MAX));
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
