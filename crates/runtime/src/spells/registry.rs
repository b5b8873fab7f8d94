//! Registry of castable spells keyed by case-insensitive name.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use spell_core::{SpellCategory, SpellDefinition, SpellKey};
use tracing::{debug, info};

use super::Spell;

/// A definition together with its behaviour.
#[derive(Clone)]
pub struct RegisteredSpell {
    definition: Arc<SpellDefinition>,
    behavior: Arc<dyn Spell>,
}

impl RegisteredSpell {
    pub fn definition(&self) -> &Arc<SpellDefinition> {
        &self.definition
    }

    pub fn behavior(&self) -> &Arc<dyn Spell> {
        &self.behavior
    }
}

/// Concurrent spell table.
#[derive(Default)]
pub struct SpellRegistry {
    spells: RwLock<HashMap<SpellKey, RegisteredSpell>>,
}

impl SpellRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SpellKey, RegisteredSpell>> {
        self.spells.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SpellKey, RegisteredSpell>> {
        self.spells.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a spell and runs its load hook. Replaces (and unloads) any
    /// spell with the same case-insensitive name.
    pub fn register(
        &self,
        definition: SpellDefinition,
        behavior: Arc<dyn Spell>,
    ) -> Arc<SpellDefinition> {
        let definition = Arc::new(definition);
        behavior.on_load(&definition);

        let entry = RegisteredSpell {
            definition: Arc::clone(&definition),
            behavior,
        };
        let previous = self.write().insert(definition.key().clone(), entry);

        if let Some(previous) = previous {
            previous.behavior.on_unload(&previous.definition);
            debug!(
                target: "spell_runtime::spells",
                spell = definition.name(),
                "replaced existing spell"
            );
        }
        info!(
            target: "spell_runtime::spells",
            spell = definition.name(),
            category = %definition.category(),
            "spell registered"
        );
        definition
    }

    /// Removes a spell and runs its unload hook. Active instances are the
    /// caller's concern.
    pub fn unregister(&self, name: &str) -> Option<RegisteredSpell> {
        let removed = self.write().remove(&SpellKey::new(name))?;
        removed.behavior.on_unload(&removed.definition);
        info!(
            target: "spell_runtime::spells",
            spell = removed.definition.name(),
            "spell unregistered"
        );
        Some(removed)
    }

    pub fn get(&self, name: &str) -> Option<RegisteredSpell> {
        self.get_key(&SpellKey::new(name))
    }

    pub fn get_key(&self, key: &SpellKey) -> Option<RegisteredSpell> {
        self.read().get(key).cloned()
    }

    pub fn definition(&self, name: &str) -> Option<Arc<SpellDefinition>> {
        self.get(name).map(|spell| spell.definition)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.read().contains_key(&SpellKey::new(name))
    }

    /// Every definition, sorted by name.
    pub fn all(&self) -> Vec<Arc<SpellDefinition>> {
        let mut all: Vec<_> = self
            .read()
            .values()
            .map(|spell| Arc::clone(&spell.definition))
            .collect();
        all.sort_by(|a, b| a.key().cmp(b.key()));
        all
    }

    pub fn by_category(&self, category: SpellCategory) -> Vec<Arc<SpellDefinition>> {
        self.all()
            .into_iter()
            .filter(|definition| definition.category() == category)
            .collect()
    }

    /// Toggles a spell. Returns `false` for unknown names.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.definition(name) {
            Some(definition) => {
                definition.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Re-enables every spell and re-runs their load hooks.
    pub fn reload(&self) -> usize {
        let spells: Vec<RegisteredSpell> = self.read().values().cloned().collect();
        for spell in &spells {
            spell.definition.set_enabled(true);
            spell.behavior.on_load(&spell.definition);
        }
        info!(target: "spell_runtime::spells", count = spells.len(), "spells reloaded");
        spells.len()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
