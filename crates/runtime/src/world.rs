//! Contracts for the collaborators the engine consumes from the host world.
//!
//! The engine never inspects the world directly. It asks an
//! [`EntityDirectory`] where entities are, a [`PermissionProvider`] what they
//! may do, and every registered [`WorldProtection`] whether casting is allowed
//! at a location. In-memory implementations are provided for embedding and
//! tests.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use spell_core::{EntityId, Location};

/// Locates live entities.
pub trait EntityDirectory: Send + Sync {
    /// Current location of `id`, or `None` when the entity is offline or gone.
    fn locate(&self, id: EntityId) -> Option<Location>;

    fn is_online(&self, id: EntityId) -> bool {
        self.locate(id).is_some()
    }
}

/// Answers permission checks during admission.
pub trait PermissionProvider: Send + Sync {
    fn has_permission(&self, caster: EntityId, key: &str) -> bool;
}

/// A region-claim system that may forbid casting in places it protects.
pub trait WorldProtection: Send + Sync {
    fn name(&self) -> &str;

    fn can_cast_here(&self, caster: EntityId, location: &Location) -> bool;
}

/// Grants every permission.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PermissionProvider for AllowAll {
    fn has_permission(&self, _caster: EntityId, _key: &str) -> bool {
        true
    }
}

/// Thread-safe table of entity positions.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: RwLock<HashMap<EntityId, Location>>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings an entity online (or moves it).
    pub fn place(&self, id: EntityId, location: Location) {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, location);
    }

    /// Takes an entity offline.
    pub fn remove(&self, id: EntityId) -> Option<Location> {
        self.entities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EntityDirectory for EntityTable {
    fn locate(&self, id: EntityId) -> Option<Location> {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied()
    }
}

/// Permission provider that grants everything except explicit revocations.
#[derive(Debug, Default)]
pub struct PermissionTable {
    revoked: RwLock<HashMap<EntityId, HashSet<String>>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoke(&self, caster: EntityId, key: impl Into<String>) {
        self.revoked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(caster)
            .or_default()
            .insert(key.into());
    }

    pub fn grant(&self, caster: EntityId, key: &str) {
        if let Some(keys) = self
            .revoked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&caster)
        {
            keys.remove(key);
        }
    }
}

impl PermissionProvider for PermissionTable {
    fn has_permission(&self, caster: EntityId, key: &str) -> bool {
        !self
            .revoked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&caster)
            .is_some_and(|keys| keys.contains(key))
    }
}

/// Protection that forbids casting within a radius of fixed points.
#[derive(Debug)]
pub struct NoCastZones {
    name: String,
    zones: Vec<(Location, f64)>,
}

impl NoCastZones {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zones: Vec::new(),
        }
    }

    pub fn with_zone(mut self, center: Location, radius: f64) -> Self {
        self.zones.push((center, radius));
        self
    }
}

impl WorldProtection for NoCastZones {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_cast_here(&self, _caster: EntityId, location: &Location) -> bool {
        !self.zones.iter().any(|(center, radius)| {
            center
                .distance_squared(location)
                .is_some_and(|d2| d2 <= radius * radius)
        })
    }
}
