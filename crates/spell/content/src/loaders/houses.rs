//! House loader.

use std::path::Path;

use serde::{Deserialize, Serialize};
use spell_core::{House, HouseBook};

use crate::loaders::{LoadResult, read_file};

/// House list structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseList {
    pub houses: Vec<House>,
}

/// Loader for houses from RON files.
pub struct HouseLoader;

impl HouseLoader {
    pub fn load(path: &Path) -> LoadResult<HouseBook> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<HouseBook> {
        let list: HouseList = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse houses RON: {}", e))?;
        Ok(HouseBook::from_houses(list.houses)?)
    }
}

#[cfg(test)]
mod tests {
    use spell_core::Element;

    use super::*;

    #[test]
    fn parses_houses() {
        let book = HouseLoader::parse(
            r#"(houses: [(name: "Ember", elements: [fire, lightning]), (name: "Hollow")])"#,
        )
        .expect("valid houses");

        assert_eq!(book.len(), 2);
        assert!(book.can_use(Some("ember"), Some(Element::Lightning)));
        assert!(!book.can_use(Some("hollow"), Some(Element::Fire)));
    }
}
