use thiserror::Error;

use crate::spell::SpellKey;

/// Number of bindable slots (one per hotbar position).
pub const SLOT_COUNT: usize = 9;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("slot {slot} is out of range")]
    OutOfRange { slot: usize },

    #[error("no spell named `{0}` is registered")]
    UnknownSpell(String),

    #[error("house `{house}` cannot use the element of `{spell}`")]
    HouseRestricted { house: String, spell: String },
}

/// Fixed-size table mapping slot index to a bound spell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SlotTable {
    slots: [Option<SpellKey>; SLOT_COUNT],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `spell` to `slot`, returning whatever was bound before.
    pub fn bind(&mut self, slot: usize, spell: SpellKey) -> Result<Option<SpellKey>, SlotError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(SlotError::OutOfRange { slot })?;
        Ok(entry.replace(spell))
    }

    pub fn unbind(&mut self, slot: usize) -> Result<Option<SpellKey>, SlotError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(SlotError::OutOfRange { slot })?;
        Ok(entry.take())
    }

    /// Spell bound to `slot`; out-of-range slots read as empty.
    pub fn get(&self, slot: usize) -> Option<&SpellKey> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied slots in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &SpellKey)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, key)| key.as_ref().map(|key| (slot, key)))
    }

    /// Clears every slot whose spell matches `predicate`; returns the cleared slots.
    pub fn unbind_where(&mut self, mut predicate: impl FnMut(&SpellKey) -> bool) -> Vec<usize> {
        let mut cleared = Vec::new();
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if entry.as_ref().is_some_and(&mut predicate) {
                *entry = None;
                cleared.push(slot);
            }
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_replaces_and_returns_previous() {
        let mut table = SlotTable::new();
        assert_eq!(table.bind(2, SpellKey::new("heal")), Ok(None));
        assert_eq!(
            table.bind(2, SpellKey::new("shield")),
            Ok(Some(SpellKey::new("heal")))
        );
        assert_eq!(table.get(2), Some(&SpellKey::new("shield")));
    }

    #[test]
    fn out_of_range_slots_are_rejected() {
        let mut table = SlotTable::new();
        assert_eq!(
            table.bind(SLOT_COUNT, SpellKey::new("heal")),
            Err(SlotError::OutOfRange { slot: SLOT_COUNT })
        );
        assert_eq!(table.get(SLOT_COUNT), None);
        assert!(table.unbind(42).is_err());
    }

    #[test]
    fn unbind_where_clears_matching_slots() {
        let mut table = SlotTable::new();
        table.bind(0, SpellKey::new("fireball")).unwrap();
        table.bind(4, SpellKey::new("heal")).unwrap();
        table.bind(8, SpellKey::new("fireball")).unwrap();

        let cleared = table.unbind_where(|key| key.as_str() == "fireball");

        assert_eq!(cleared, vec![0, 8]);
        assert_eq!(table.iter().count(), 1);
    }
}
