use std::collections::HashMap;

use crate::spell::SpellKey;

/// Per-spell cooldown expiries, in milliseconds on the engine clock.
///
/// Entries are never pruned: an expired entry simply compares as "not on
/// cooldown" and is overwritten by the next write for that spell.
#[derive(Clone, Debug, Default)]
pub struct CooldownLedger {
    expiries: HashMap<SpellKey, u64>,
}

impl CooldownLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff an entry exists and `now_ms < expiry`.
    pub fn is_on_cooldown(&self, spell: &SpellKey, now_ms: u64) -> bool {
        self.expiries
            .get(spell)
            .is_some_and(|expiry| now_ms < *expiry)
    }

    /// Writes `expiry = now + duration`, replacing any previous entry.
    pub fn set_cooldown(&mut self, spell: &SpellKey, duration_ms: u64, now_ms: u64) {
        self.expiries
            .insert(spell.clone(), now_ms.saturating_add(duration_ms));
    }

    pub fn expiry(&self, spell: &SpellKey) -> Option<u64> {
        self.expiries.get(spell).copied()
    }

    /// Milliseconds left, or `None` when the spell is not on cooldown.
    pub fn remaining_ms(&self, spell: &SpellKey, now_ms: u64) -> Option<u64> {
        self.expiries
            .get(spell)
            .and_then(|expiry| expiry.checked_sub(now_ms))
            .filter(|remaining| *remaining > 0)
    }

    pub fn clear(&mut self, spell: &SpellKey) {
        self.expiries.remove(spell);
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }
}
