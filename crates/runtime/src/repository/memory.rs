//! In-memory CasterRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use spell_core::{CasterRecord, EntityId};

use super::{CasterRepository, RepositoryError, Result};

/// In-memory implementation of CasterRepository.
#[derive(Debug, Default)]
pub struct InMemoryCasterRepo {
    records: RwLock<HashMap<EntityId, CasterRecord>>,
}

impl InMemoryCasterRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-existing records.
    pub fn with_records(records: impl IntoIterator<Item = CasterRecord>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().map(|r| (r.id, r)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CasterRepository for InMemoryCasterRepo {
    fn load(&self, id: EntityId) -> Result<Option<CasterRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&id).cloned())
    }

    fn save(&self, record: &CasterRecord) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn exists(&self, id: EntityId) -> bool {
        self.records
            .read()
            .map(|records| records.contains_key(&id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_returns_latest() {
        let repo = InMemoryCasterRepo::new();
        let mut record = CasterRecord::fresh(EntityId(4), 100);
        repo.save(&record).unwrap();
        record.magic = 12;
        repo.save(&record).unwrap();

        assert_eq!(repo.load(EntityId(4)).unwrap().map(|r| r.magic), Some(12));
        assert!(repo.load(EntityId(5)).unwrap().is_none());
        assert_eq!(repo.len(), 1);
    }
}
