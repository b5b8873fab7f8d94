//! Perk table loader.

use std::path::Path;

use spell_core::PerkTable;

use crate::loaders::{LoadResult, read_file};

/// Loader for perk modifiers from TOML files.
pub struct PerkLoader;

impl PerkLoader {
    pub fn load(path: &Path) -> LoadResult<PerkTable> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<PerkTable> {
        let table: PerkTable = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse perks TOML: {}", e))?;
        Ok(table.normalized())
    }
}

#[cfg(test)]
mod tests {
    use spell_core::Element;

    use super::*;

    #[test]
    fn parses_house_and_element_sections() {
        let table = PerkLoader::parse(
            r#"
            [houses.Ember]
            magic-cost-multiplier = 0.5
            magic-regen-bonus = 2

            [elements.fire]
            cooldown-multiplier = 0.25
            "#,
        )
        .expect("valid perks");

        assert_eq!(table.modify_magic_cost(Some(30), Some("ember"), None), Some(15));
        assert_eq!(
            table.modify_cooldown(Some(4_000), None, Some(Element::Fire)),
            Some(1_000)
        );
        assert_eq!(table.bonus_regen(Some("EMBER")), 2);
    }

    #[test]
    fn empty_file_is_neutral() {
        let table = PerkLoader::parse("").expect("empty perks");
        assert_eq!(table, PerkTable::new());
    }
}
