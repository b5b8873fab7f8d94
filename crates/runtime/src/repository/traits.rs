//! Repository contract for caster persistence.

use spell_core::{CasterRecord, EntityId};

use super::Result;

/// Durable store of caster records.
///
/// Cooldowns and active instances are never persisted.
pub trait CasterRepository: Send + Sync {
    /// Load a caster, or `None` for a caster seen for the first time.
    fn load(&self, id: EntityId) -> Result<Option<CasterRecord>>;

    /// Save (insert or replace) a caster.
    fn save(&self, record: &CasterRecord) -> Result<()>;

    /// Check if a record exists
    fn exists(&self, id: EntityId) -> bool {
        matches!(self.load(id), Ok(Some(_)))
    }
}
