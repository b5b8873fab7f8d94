//! Content loaders for reading spell data from files.
//!
//! Every loader exposes `load(path)` for files and `parse(str)` for inline
//! content, so tests and tools can skip the filesystem.

pub mod factory;
pub mod houses;
pub mod perks;
pub mod settings;
pub mod spells;

pub use factory::ContentFactory;
pub use houses::HouseLoader;
pub use perks::PerkLoader;
pub use settings::{EngineSettings, SettingsLoader};
pub use spells::{SpellCatalog, SpellCatalogLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
