//! Cost, cooldown and regeneration modifiers granted by houses and elements.
use std::collections::HashMap;

use crate::spell::Element;

/// One set of multipliers.
///
/// Multipliers below zero are treated as zero when applied.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct PerkModifiers {
    pub magic_cost_multiplier: f64,
    pub cooldown_multiplier: f64,
    pub magic_regen_bonus: u32,
}

impl PerkModifiers {
    pub const NEUTRAL: Self = Self {
        magic_cost_multiplier: 1.0,
        cooldown_multiplier: 1.0,
        magic_regen_bonus: 0,
    };
}

impl Default for PerkModifiers {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Per-house and per-element modifiers.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PerkTable {
    houses: HashMap<String, PerkModifiers>,
    elements: HashMap<String, PerkModifiers>,
}

impl PerkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_house(mut self, house: &str, modifiers: PerkModifiers) -> Self {
        self.houses.insert(house.to_lowercase(), modifiers);
        self
    }

    pub fn with_element(mut self, element: Element, modifiers: PerkModifiers) -> Self {
        self.elements.insert(element.as_ref().to_owned(), modifiers);
        self
    }

    /// Lower-cases every key so lookups are case-insensitive.
    pub fn normalized(self) -> Self {
        let lower = |map: HashMap<String, PerkModifiers>| {
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect()
        };
        Self {
            houses: lower(self.houses),
            elements: lower(self.elements),
        }
    }

    fn house(&self, house: Option<&str>) -> PerkModifiers {
        house
            .and_then(|name| self.houses.get(&name.to_lowercase()))
            .copied()
            .unwrap_or_default()
    }

    fn element(&self, element: Option<Element>) -> PerkModifiers {
        element
            .and_then(|element| self.elements.get(element.as_ref()))
            .copied()
            .unwrap_or_default()
    }

    fn multiplier(&self, house: Option<&str>, element: Option<Element>, cost: bool) -> f64 {
        let (h, e) = (self.house(house), self.element(element));
        let product = if cost {
            h.magic_cost_multiplier * e.magic_cost_multiplier
        } else {
            h.cooldown_multiplier * e.cooldown_multiplier
        };
        if product.is_finite() { product.max(0.0) } else { 1.0 }
    }

    /// `round(cost × house × element)`, or `None` when the spell is free.
    pub fn modify_magic_cost(
        &self,
        cost: Option<u32>,
        house: Option<&str>,
        element: Option<Element>,
    ) -> Option<u32> {
        let cost = cost?;
        let scaled = (f64::from(cost) * self.multiplier(house, element, true)).round();
        Some(scaled.min(f64::from(u32::MAX)) as u32)
    }

    /// `floor(cooldown × house × element)`, or `None` when the spell has no cooldown.
    pub fn modify_cooldown(
        &self,
        cooldown_ms: Option<u64>,
        house: Option<&str>,
        element: Option<Element>,
    ) -> Option<u64> {
        let cooldown_ms = cooldown_ms?;
        let scaled = (cooldown_ms as f64 * self.multiplier(house, element, false)).floor();
        Some(scaled.min(u64::MAX as f64) as u64)
    }

    /// Extra regeneration granted to members of `house`.
    pub fn bonus_regen(&self, house: Option<&str>) -> u32 {
        self.house(house).magic_regen_bonus
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PerkTable {
        PerkTable::new()
            .with_house(
                "Ember",
                PerkModifiers {
                    magic_cost_multiplier: 0.9,
                    cooldown_multiplier: 0.5,
                    magic_regen_bonus: 3,
                },
            )
            .with_element(
                Element::Fire,
                PerkModifiers {
                    magic_cost_multiplier: 1.5,
                    ..PerkModifiers::NEUTRAL
                },
            )
    }

    #[test]
    fn multipliers_compose_and_round() {
        let table = table();
        // 21 * 0.9 * 1.5 = 28.35
        assert_eq!(
            table.modify_magic_cost(Some(21), Some("ember"), Some(Element::Fire)),
            Some(28)
        );
        assert_eq!(
            table.modify_cooldown(Some(5_001), Some("EMBER"), Some(Element::Fire)),
            Some(2_500)
        );
    }

    #[test]
    fn unknown_keys_are_neutral() {
        let table = table();
        assert_eq!(table.modify_magic_cost(Some(30), None, None), Some(30));
        assert_eq!(table.modify_cooldown(Some(800), Some("tide"), None), Some(800));
        assert_eq!(table.modify_magic_cost(None, Some("ember"), None), None);
        assert_eq!(table.bonus_regen(Some("ember")), 3);
        assert_eq!(table.bonus_regen(None), 0);
    }

    #[test]
    fn negative_multipliers_clamp_to_zero() {
        let table = PerkTable::new().with_house(
            "cursed",
            PerkModifiers {
                magic_cost_multiplier: -2.0,
                ..PerkModifiers::NEUTRAL
            },
        );
        assert_eq!(table.modify_magic_cost(Some(30), Some("cursed"), None), Some(0));
    }
}
