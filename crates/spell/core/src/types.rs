//! Identity and spatial primitives.
//!
//! Locations are continuous world coordinates. Chunks are 16×16 columns and
//! regions group `2^shift × 2^shift` chunks; the regional scheduler backend maps
//! a [`RegionPos`] to the execution domain that owns it.
use std::fmt;

/// Unique identifier for any entity (players included) known to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Identifier of a world (dimension) that owns its own coordinate space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldId(pub u32);

/// A point in a world.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub const fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }

    /// Returns a copy moved by the given deltas.
    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.world, self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chunk column containing this location.
    pub fn chunk(&self) -> ChunkPos {
        ChunkPos {
            world: self.world,
            x: (self.x.floor() as i32) >> 4,
            z: (self.z.floor() as i32) >> 4,
        }
    }

    /// Region containing this location for a region size of `2^shift` chunks.
    pub fn region(&self, shift: u32) -> RegionPos {
        let chunk = self.chunk();
        RegionPos {
            world: self.world,
            x: chunk.x >> shift,
            z: chunk.z >> shift,
        }
    }

    /// Squared distance, or `None` when the points live in different worlds.
    pub fn distance_squared(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some(dx * dx + dy * dy + dz * dz)
    }

    pub fn distance(&self, other: &Location) -> Option<f64> {
        self.distance_squared(other).map(f64::sqrt)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "world{}({:.1}, {:.1}, {:.1})",
            self.world.0, self.x, self.y, self.z
        )
    }
}

/// A 16×16 column of the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkPos {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}

/// A spatial partition: the unit of ownership in the regional backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegionPos {
    pub world: WorldId,
    pub x: i32,
    pub z: i32,
}
