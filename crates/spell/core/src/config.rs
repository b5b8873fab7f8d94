/// Tunable parameters of the magic resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct MagicSettings {
    /// Upper bound of every caster's magic pool.
    pub max_magic: u32,
    /// Scheduling units between two regeneration passes.
    pub regen_interval_ticks: u64,
    /// Base amount restored per pass, before house bonuses.
    pub regen_amount: u32,
}

impl MagicSettings {
    pub const DEFAULT_MAX_MAGIC: u32 = 100;
    pub const DEFAULT_REGEN_INTERVAL_TICKS: u64 = 40;
    pub const DEFAULT_REGEN_AMOUNT: u32 = 2;

    pub const fn new() -> Self {
        Self {
            max_magic: Self::DEFAULT_MAX_MAGIC,
            regen_interval_ticks: Self::DEFAULT_REGEN_INTERVAL_TICKS,
            regen_amount: Self::DEFAULT_REGEN_AMOUNT,
        }
    }
}

impl Default for MagicSettings {
    fn default() -> Self {
        Self::new()
    }
}
