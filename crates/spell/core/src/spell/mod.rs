//! Spell metadata and the cast outcome taxonomy.

mod definition;
mod outcome;

pub use definition::{
    ActivationTrigger, Element, SpellCategory, SpellDefinition, SpellKey, SpellSpec,
};
pub use outcome::CastOutcome;
