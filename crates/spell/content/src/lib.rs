//! Data-driven content definitions and loaders.
//!
//! This crate turns RON/TOML data files into spell-core types:
//! - Spell catalog (data-driven via RON)
//! - Houses and their permitted elements (data-driven via RON)
//! - Perk modifiers per house and element (data-driven via TOML)
//! - Engine settings such as magic regeneration (data-driven via TOML)
//!
//! Spell behaviour is code and is attached by the runtime; content only
//! carries metadata.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    ContentFactory, EngineSettings, HouseLoader, LoadResult, PerkLoader, SettingsLoader,
    SpellCatalog, SpellCatalogLoader,
};
