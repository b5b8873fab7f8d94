//! Engine settings loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::MagicSettings;

use crate::loaders::{LoadResult, read_file};

/// Top-level layout of `settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub magic: MagicSettings,
}

/// Loader for engine settings from TOML files.
pub struct SettingsLoader;

impl SettingsLoader {
    pub fn load(path: &Path) -> LoadResult<EngineSettings> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<EngineSettings> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse settings TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let settings = SettingsLoader::parse("[magic]\nmax-magic = 150\n").expect("valid settings");
        assert_eq!(settings.magic.max_magic, 150);
        assert_eq!(
            settings.magic.regen_amount,
            MagicSettings::DEFAULT_REGEN_AMOUNT
        );
    }
}
