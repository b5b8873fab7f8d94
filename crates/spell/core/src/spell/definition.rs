//! Immutable spell metadata.
//!
//! A [`SpellDefinition`] is created at registration time and never changes
//! except for its `enabled` flag, which administrators toggle at runtime. The
//! behaviour attached to a definition lives in the runtime crate.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Case-insensitive identity of a spell.
///
/// Two definitions whose names differ only in case share a key, so lookups,
/// cooldown entries and slot bindings all go through this type.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpellKey(String);

impl SpellKey {
    pub fn new(name: &str) -> Self {
        Self(name.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpellKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for SpellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Broad grouping used by listings and admin tooling.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SpellCategory {
    #[default]
    Combat,
    Elemental,
    Healing,
    Protection,
    Transportation,
    Utility,
}

/// Classification consumed by house restrictions and element permissions.
///
/// The engine never interprets an element beyond equality.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    Air,
    Earth,
    Fire,
    Lightning,
    Nature,
    Void,
    Water,
}

/// Input that starts a cast.
///
/// `Sneak` spells have no discrete trigger: they begin when the caster starts
/// sneaking and usually keep running while sneaking continues.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActivationTrigger {
    #[default]
    LeftClick,
    RightClick,
    Sneak,
}

impl ActivationTrigger {
    /// Returns true for click-style triggers.
    pub const fn is_discrete(self) -> bool {
        !matches!(self, Self::Sneak)
    }
}

/// Serializable description of a spell, as found in content files.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpellSpec {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub instructions: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub category: SpellCategory,
    #[cfg_attr(feature = "serde", serde(default))]
    pub magic_cost: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown_ms: Option<u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub range: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default = "enabled_by_default"))]
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub trigger: ActivationTrigger,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Option<Element>,
}

#[cfg(feature = "serde")]
fn enabled_by_default() -> bool {
    true
}

/// Registered metadata of one castable ability.
#[derive(Debug)]
pub struct SpellDefinition {
    name: String,
    key: SpellKey,
    description: String,
    instructions: String,
    category: SpellCategory,
    magic_cost: Option<u32>,
    cooldown_ms: Option<u64>,
    range: Option<f64>,
    trigger: ActivationTrigger,
    element: Option<Element>,
    enabled: AtomicBool,
}

impl SpellDefinition {
    pub fn new(name: impl Into<String>, category: SpellCategory) -> Self {
        let name = name.into();
        Self {
            key: SpellKey::new(&name),
            name,
            description: String::new(),
            instructions: String::new(),
            category,
            magic_cost: None,
            cooldown_ms: None,
            range: None,
            trigger: ActivationTrigger::default(),
            element: None,
            enabled: AtomicBool::new(true),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn with_magic_cost(mut self, cost: u32) -> Self {
        self.magic_cost = Some(cost);
        self
    }

    pub fn with_cooldown_ms(mut self, cooldown_ms: u64) -> Self {
        self.cooldown_ms = Some(cooldown_ms);
        self
    }

    /// Sets the range; non-positive or non-finite values leave it absent.
    pub fn with_range(mut self, range: f64) -> Self {
        self.range = Some(range).filter(|r| r.is_finite() && *r > 0.0);
        self
    }

    pub fn with_trigger(mut self, trigger: ActivationTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &SpellKey {
        &self.key
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn category(&self) -> SpellCategory {
        self.category
    }

    pub fn magic_cost(&self) -> Option<u32> {
        self.magic_cost
    }

    pub fn cooldown_ms(&self) -> Option<u64> {
        self.cooldown_ms
    }

    pub fn range(&self) -> Option<f64> {
        self.range
    }

    pub fn trigger(&self) -> ActivationTrigger {
        self.trigger
    }

    pub fn element(&self) -> Option<Element> {
        self.element
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// Permission required to cast this spell.
    pub fn permission_key(&self) -> String {
        format!("spellcraft.spell.{}", self.key)
    }

    /// Permission required to wield this spell's element, if it has one.
    pub fn element_permission_key(&self) -> Option<String> {
        self.element
            .map(|element| format!("spellcraft.element.{}", element.as_ref()))
    }
}

impl From<SpellSpec> for SpellDefinition {
    fn from(spec: SpellSpec) -> Self {
        let mut definition = SpellDefinition::new(spec.name, spec.category)
            .with_description(spec.description)
            .with_instructions(spec.instructions)
            .with_trigger(spec.trigger)
            .with_enabled(spec.enabled);
        definition.magic_cost = spec.magic_cost;
        definition.cooldown_ms = spec.cooldown_ms;
        definition.range = spec.range.filter(|r| r.is_finite() && *r > 0.0);
        definition.element = spec.element;
        definition
    }
}
