//! Houses restrict which elements their members may wield.
use std::collections::HashMap;

use thiserror::Error;

use crate::spell::Element;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum HouseError {
    #[error("unknown house `{0}`")]
    Unknown(String),

    #[error("house `{0}` is defined twice")]
    Duplicate(String),
}

/// A named faction and the elements it is allowed to use.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct House {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub elements: Vec<Element>,
}

impl House {
    pub fn new(name: impl Into<String>, elements: impl IntoIterator<Item = Element>) -> Self {
        Self {
            name: name.into(),
            elements: elements.into_iter().collect(),
        }
    }

    pub fn can_use(&self, element: Element) -> bool {
        self.elements.contains(&element)
    }
}

/// Lookup table of houses keyed by lower-cased name.
#[derive(Clone, Debug, Default)]
pub struct HouseBook {
    houses: HashMap<String, House>,
}

impl HouseBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book, rejecting names that collide case-insensitively.
    pub fn from_houses(houses: impl IntoIterator<Item = House>) -> Result<Self, HouseError> {
        let mut book = Self::new();
        for house in houses {
            let key = house.name.to_lowercase();
            if book.houses.contains_key(&key) {
                return Err(HouseError::Duplicate(house.name));
            }
            book.houses.insert(key, house);
        }
        Ok(book)
    }

    pub fn insert(&mut self, house: House) {
        self.houses.insert(house.name.to_lowercase(), house);
    }

    pub fn get(&self, name: &str) -> Option<&House> {
        self.houses.get(&name.to_lowercase())
    }

    /// Resolves a house by name, failing for names not in the book.
    pub fn require(&self, name: &str) -> Result<&House, HouseError> {
        self.get(name)
            .ok_or_else(|| HouseError::Unknown(name.to_owned()))
    }

    /// Whether a member of `house` may use a spell of `element`.
    ///
    /// Casters without a house, element-less spells and houses missing from the
    /// book are all unrestricted.
    pub fn can_use(&self, house: Option<&str>, element: Option<Element>) -> bool {
        match (house.and_then(|name| self.get(name)), element) {
            (Some(house), Some(element)) => house.can_use(element),
            _ => true,
        }
    }

    pub fn len(&self) -> usize {
        self.houses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.houses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &House> {
        self.houses.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> HouseBook {
        HouseBook::from_houses([
            House::new("Ember", [Element::Fire, Element::Lightning]),
            House::new("Tide", [Element::Water, Element::Air]),
        ])
        .expect("distinct houses")
    }

    #[test]
    fn restricts_elements_by_house() {
        let book = book();
        assert!(book.can_use(Some("ember"), Some(Element::Fire)));
        assert!(!book.can_use(Some("EMBER"), Some(Element::Water)));
    }

    #[test]
    fn missing_data_is_unrestricted() {
        let book = book();
        assert!(book.can_use(None, Some(Element::Void)));
        assert!(book.can_use(Some("tide"), None));
        assert!(book.can_use(Some("nobody"), Some(Element::Void)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = HouseBook::from_houses([House::new("Tide", []), House::new("tide", [])])
            .unwrap_err();
        assert_eq!(err, HouseError::Duplicate("tide".into()));
        assert!(book().require("storm").is_err());
    }
}
