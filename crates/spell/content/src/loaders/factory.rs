//! Content factory for loading every data file from one directory.

use std::path::{Path, PathBuf};

use spell_core::{HouseBook, PerkTable, SpellSpec};

use crate::loaders::{
    EngineSettings, HouseLoader, LoadResult, PerkLoader, SettingsLoader, SpellCatalogLoader,
};

/// Content factory that loads all spell content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── settings.toml
/// ├── perks.toml
/// ├── spells.ron
/// └── houses.ron
/// ```
///
/// `settings.toml`, `perks.toml` and `houses.ron` are optional; a missing file
/// yields the neutral default.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load the spell catalog from `spells.ron`.
    pub fn load_spells(&self) -> LoadResult<Vec<SpellSpec>> {
        SpellCatalogLoader::load(&self.data_dir.join("spells.ron"))
    }

    /// Load houses from `houses.ron`.
    pub fn load_houses(&self) -> LoadResult<HouseBook> {
        let path = self.data_dir.join("houses.ron");
        if !path.exists() {
            return Ok(HouseBook::new());
        }
        HouseLoader::load(&path)
    }

    /// Load perk modifiers from `perks.toml`.
    pub fn load_perks(&self) -> LoadResult<PerkTable> {
        let path = self.data_dir.join("perks.toml");
        if !path.exists() {
            return Ok(PerkTable::new());
        }
        PerkLoader::load(&path)
    }

    /// Load engine settings from `settings.toml`.
    pub fn load_settings(&self) -> LoadResult<EngineSettings> {
        let path = self.data_dir.join("settings.toml");
        if !path.exists() {
            return Ok(EngineSettings::default());
        }
        SettingsLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
