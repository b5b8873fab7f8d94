//! Pure casting rules and data types shared across the engine.
//!
//! `spell-core` defines the canonical vocabulary of the ability engine: spell
//! definitions, the caster's resource ledger (magic pool + cooldowns), bound
//! slots, the cast outcome taxonomy and the spatial types used to pick an
//! execution domain. Nothing here performs I/O or touches threads; the runtime
//! crate layers scheduling and concurrency on top of these types.
pub mod caster;
pub mod config;
pub mod house;
pub mod perks;
pub mod spell;
pub mod types;

pub use caster::{Caster, CasterRecord, CooldownLedger, MagicPool, SLOT_COUNT, SlotError, SlotTable};
pub use config::MagicSettings;
pub use house::{House, HouseBook, HouseError};
pub use perks::{PerkModifiers, PerkTable};
pub use spell::{
    ActivationTrigger, CastOutcome, Element, SpellCategory, SpellDefinition, SpellKey, SpellSpec,
};
pub use types::{ChunkPos, EntityId, Location, RegionPos, WorldId};
