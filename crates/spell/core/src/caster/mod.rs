//! Caster-owned state: the resource ledger and bound slots.
//!
//! A [`Caster`] is plain data. The runtime wraps it in a lock and serializes
//! all admission checks and ledger writes for one caster behind a cast gate.

mod cooldown;
mod magic;
mod slots;

use std::collections::BTreeMap;

pub use cooldown::CooldownLedger;
pub use magic::MagicPool;
pub use slots::{SLOT_COUNT, SlotError, SlotTable};

use crate::spell::SpellKey;
use crate::types::EntityId;

/// In-memory state of one caster.
#[derive(Clone, Debug)]
pub struct Caster {
    id: EntityId,
    magic: MagicPool,
    cooldowns: CooldownLedger,
    slots: SlotTable,
    house: Option<String>,
}

impl Caster {
    /// Creates a caster with a full pool.
    pub fn new(id: EntityId, max_magic: u32) -> Self {
        Self {
            id,
            magic: MagicPool::full(max_magic),
            cooldowns: CooldownLedger::new(),
            slots: SlotTable::new(),
            house: None,
        }
    }

    /// Rebuilds a caster from its persisted form.
    ///
    /// The stored pool is clamped to `max_magic`. Binds that do not fit the
    /// slot table are skipped and their slot numbers returned.
    pub fn from_record(record: &CasterRecord, max_magic: u32) -> (Self, Vec<u8>) {
        let mut caster = Self::new(record.id, max_magic);
        caster.magic.set(record.magic);
        caster.house = record.house.clone();
        let mut skipped = Vec::new();
        for (slot, name) in &record.binds {
            if caster
                .slots
                .bind(usize::from(*slot), SpellKey::new(name))
                .is_err()
            {
                skipped.push(*slot);
            }
        }
        (caster, skipped)
    }

    /// Captures the persisted subset of this caster.
    pub fn to_record(&self) -> CasterRecord {
        CasterRecord {
            id: self.id,
            magic: self.magic.current(),
            house: self.house.clone(),
            binds: self
                .slots
                .iter()
                .filter_map(|(slot, key)| {
                    u8::try_from(slot)
                        .ok()
                        .map(|slot| (slot, key.as_str().to_owned()))
                })
                .collect(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn magic(&self) -> &MagicPool {
        &self.magic
    }

    pub fn magic_mut(&mut self) -> &mut MagicPool {
        &mut self.magic
    }

    pub fn cooldowns(&self) -> &CooldownLedger {
        &self.cooldowns
    }

    pub fn cooldowns_mut(&mut self) -> &mut CooldownLedger {
        &mut self.cooldowns
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotTable {
        &mut self.slots
    }

    pub fn house(&self) -> Option<&str> {
        self.house.as_deref()
    }

    pub fn set_house(&mut self, house: Option<String>) {
        self.house = house;
    }

    pub fn has_magic(&self, cost: Option<u32>) -> bool {
        self.magic.has(cost)
    }

    pub fn consume_magic(&mut self, cost: Option<u32>) {
        self.magic.consume(cost);
    }

    pub fn regenerate_magic(&mut self, amount: u32) {
        self.magic.regenerate(amount);
    }

    pub fn is_on_cooldown(&self, spell: &SpellKey, now_ms: u64) -> bool {
        self.cooldowns.is_on_cooldown(spell, now_ms)
    }

    pub fn set_cooldown(&mut self, spell: &SpellKey, duration_ms: u64, now_ms: u64) {
        self.cooldowns.set_cooldown(spell, duration_ms, now_ms);
    }
}

/// Persisted layout of a caster.
///
/// Cooldowns are intentionally absent: they do not survive a reconnect.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CasterRecord {
    pub id: EntityId,
    pub magic: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub house: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub binds: BTreeMap<u8, String>,
}

impl CasterRecord {
    /// Record for a caster seen for the first time.
    pub fn fresh(id: EntityId, max_magic: u32) -> Self {
        Self {
            id,
            magic: max_magic,
            house: None,
            binds: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trip_keeps_binds_and_clamps_magic() {
        let mut record = CasterRecord::fresh(EntityId(7), 100);
        record.magic = 250;
        record.house = Some("ember".into());
        record.binds.insert(0, "Flamethrower".into());
        record.binds.insert(200, "Lost".into());

        let (caster, skipped) = Caster::from_record(&record, 100);

        assert_eq!(skipped, vec![200]);
        assert_eq!(caster.magic().current(), 100);
        assert_eq!(caster.house(), Some("ember"));
        assert_eq!(caster.slots().get(0), Some(&SpellKey::new("flamethrower")));

        let saved = caster.to_record();
        assert_eq!(saved.binds.len(), 1);
        assert_eq!(saved.binds.get(&0).map(String::as_str), Some("flamethrower"));
    }
}
