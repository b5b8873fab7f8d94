//! Spell catalog loader.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::{SpellKey, SpellSpec};

use crate::loaders::{LoadResult, read_file};

/// Spell catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellCatalog {
    pub spells: Vec<SpellSpec>,
}

/// Loader for the spell catalog from RON files.
pub struct SpellCatalogLoader;

impl SpellCatalogLoader {
    /// Load the spell catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<Vec<SpellSpec>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse catalog content, rejecting names that collide case-insensitively.
    pub fn parse(content: &str) -> LoadResult<Vec<SpellSpec>> {
        let catalog: SpellCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse spell catalog RON: {}", e))?;

        let mut seen = HashSet::new();
        for spec in &catalog.spells {
            if spec.name.trim().is_empty() {
                anyhow::bail!("Spell catalog contains an entry without a name");
            }
            if !seen.insert(SpellKey::new(&spec.name)) {
                anyhow::bail!("Spell `{}` is defined more than once", spec.name);
            }
        }

        Ok(catalog.spells)
    }
}

#[cfg(test)]
mod tests {
    use spell_core::{ActivationTrigger, Element, SpellCategory};

    use super::*;

    #[test]
    fn parses_catalog_with_defaults() {
        let specs = SpellCatalogLoader::parse(
            r#"
            #![enable(implicit_some)]
            (
                spells: [
                    (
                        name: "Flamethrower",
                        category: elemental,
                        magic_cost: 30,
                        cooldown_ms: 5000,
                        range: 12.0,
                        element: fire,
                        trigger: sneak,
                    ),
                    (name: "Heal", category: healing),
                ],
            )
            "#,
        )
        .expect("valid catalog");

        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].element, Some(Element::Fire));
        assert_eq!(specs[0].trigger, ActivationTrigger::Sneak);
        assert_eq!(specs[1].category, SpellCategory::Healing);
        assert_eq!(specs[1].magic_cost, None);
        assert!(specs[1].enabled);
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = SpellCatalogLoader::parse(
            r#"(spells: [(name: "Heal"), (name: "HEAL")])"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }
}
