//! In-memory caster table backed by a [`CasterRepository`].
//!
//! Casters are loaded once, on first reference, and reused until they
//! disconnect. Loading also repairs stale data: binds to spells that no longer
//! exist, or that the caster's house may not use, are dropped.

mod entry;

pub use entry::{CastGate, CasterEntry};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use spell_core::{Caster, CasterRecord, EntityId, HouseBook, MagicSettings};
use tracing::{debug, error, info, warn};

use crate::repository::CasterRepository;
use crate::scheduler::{Affinity, Dispatch, Scheduler};
use crate::spells::SpellRegistry;

pub struct CasterManager {
    casters: RwLock<HashMap<EntityId, Arc<CasterEntry>>>,
    repository: Arc<dyn CasterRepository>,
    magic: MagicSettings,
    spells: Arc<SpellRegistry>,
    houses: Arc<HouseBook>,
}

impl CasterManager {
    pub fn new(
        repository: Arc<dyn CasterRepository>,
        magic: MagicSettings,
        spells: Arc<SpellRegistry>,
        houses: Arc<HouseBook>,
    ) -> Self {
        Self {
            casters: RwLock::new(HashMap::new()),
            repository,
            magic,
            spells,
            houses,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<EntityId, Arc<CasterEntry>>> {
        self.casters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<EntityId, Arc<CasterEntry>>> {
        self.casters.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn magic_settings(&self) -> &MagicSettings {
        &self.magic
    }

    pub fn get_if_loaded(&self, id: EntityId) -> Option<Arc<CasterEntry>> {
        self.read().get(&id).cloned()
    }

    /// Returns the loaded caster, loading it from the repository on first use.
    pub fn get_or_load(&self, id: EntityId) -> Arc<CasterEntry> {
        if let Some(entry) = self.get_if_loaded(id) {
            return entry;
        }

        let caster = self.load(id);
        let mut casters = self.write();
        Arc::clone(
            casters
                .entry(id)
                .or_insert_with(|| Arc::new(CasterEntry::new(caster))),
        )
    }

    /// Inserts a caster unless one with the same id is already loaded.
    pub fn register(&self, mut caster: Caster) -> Arc<CasterEntry> {
        self.sanitize(&mut caster);
        let mut casters = self.write();
        Arc::clone(
            casters
                .entry(caster.id())
                .or_insert_with(|| Arc::new(CasterEntry::new(caster))),
        )
    }

    fn load(&self, id: EntityId) -> Caster {
        let record = match self.repository.load(id) {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(target: "spell_runtime::casters", caster = %id, "new caster");
                CasterRecord::fresh(id, self.magic.max_magic)
            }
            Err(error) => {
                warn!(
                    target: "spell_runtime::casters",
                    caster = %id,
                    %error,
                    "failed to load caster; starting fresh"
                );
                CasterRecord::fresh(id, self.magic.max_magic)
            }
        };

        let (mut caster, skipped) = Caster::from_record(&record, self.magic.max_magic);
        if !skipped.is_empty() {
            warn!(
                target: "spell_runtime::casters",
                caster = %id,
                slots = ?skipped,
                "stored binds outside the slot table; dropping"
            );
        }
        self.sanitize(&mut caster);
        caster
    }

    fn sanitize(&self, caster: &mut Caster) {
        if let Some(house) = caster.house().map(str::to_owned)
            && self.houses.get(&house).is_none()
        {
            warn!(
                target: "spell_runtime::casters",
                caster = %caster.id(),
                house = %house,
                "unknown house; clearing"
            );
            caster.set_house(None);
        }

        let house = caster.house().map(str::to_owned);
        let spells = &self.spells;
        let houses = &self.houses;
        let dropped = caster.slots_mut().unbind_where(|key| match spells.get_key(key) {
            None => true,
            Some(spell) => !houses.can_use(house.as_deref(), spell.definition().element()),
        });

        if !dropped.is_empty() {
            debug!(
                target: "spell_runtime::casters",
                caster = %caster.id(),
                slots = ?dropped,
                "dropped stale binds"
            );
        }
    }

    /// Drops a caster from memory after a synchronous save.
    ///
    /// Active instances must be stopped by the caller first.
    pub fn disconnect(&self, id: EntityId) -> Option<Caster> {
        let entry = self.write().remove(&id)?;
        let caster = entry.snapshot();
        self.persist(&caster.to_record());
        debug!(target: "spell_runtime::casters", caster = %id, "caster unloaded");
        Some(caster)
    }

    /// Saves one loaded caster synchronously.
    pub fn save(&self, id: EntityId) -> bool {
        match self.get_if_loaded(id) {
            Some(entry) => self.persist(&entry.snapshot().to_record()),
            None => false,
        }
    }

    /// Snapshots every loaded caster and saves them on the async affinity.
    ///
    /// Returns the number of saves dispatched.
    pub fn save_all(&self, scheduler: &Scheduler) -> usize {
        let mut dispatched = 0;
        for entry in self.entries() {
            let record = entry.snapshot().to_record();
            let repository = Arc::clone(&self.repository);
            let outcome = scheduler.run(Affinity::Async, move || {
                if let Err(error) = repository.save(&record) {
                    error!(
                        target: "spell_runtime::casters",
                        caster = %record.id,
                        %error,
                        "failed to save caster"
                    );
                }
            });
            if outcome != Dispatch::Declined {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Saves every loaded caster on the calling thread.
    pub fn save_all_now(&self) -> usize {
        let saved = self
            .entries()
            .iter()
            .filter(|entry| self.persist(&entry.snapshot().to_record()))
            .count();
        info!(target: "spell_runtime::casters", saved, "casters saved");
        saved
    }

    fn persist(&self, record: &CasterRecord) -> bool {
        match self.repository.save(record) {
            Ok(()) => true,
            Err(error) => {
                error!(
                    target: "spell_runtime::casters",
                    caster = %record.id,
                    %error,
                    "failed to save caster"
                );
                false
            }
        }
    }

    /// Forgets every loaded caster without saving.
    pub fn clear(&self) {
        self.write().clear();
    }

    pub fn entries(&self) -> Vec<Arc<CasterEntry>> {
        self.read().values().cloned().collect()
    }

    pub fn loaded_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
