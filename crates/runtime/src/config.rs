//! Runtime configuration and environment overrides.

use std::env;
use std::time::Duration;

use spell_core::MagicSettings;

use crate::scheduler::{ClassicBackend, RegionalBackend, SchedulerBackend};

/// Which concurrency model the scheduler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// One authoritative domain for all world-touching work.
    #[default]
    Classic,
    /// A global domain plus `partitions` region-owning domains.
    Regional { partitions: usize, region_shift: u32 },
}

impl BackendKind {
    pub const DEFAULT_REGION_SHIFT: u32 = 3;

    pub fn regional(partitions: usize) -> Self {
        Self::Regional {
            partitions: partitions.max(1),
            region_shift: Self::DEFAULT_REGION_SHIFT,
        }
    }

    pub(crate) fn build(self) -> Box<dyn SchedulerBackend> {
        match self {
            Self::Classic => Box::new(ClassicBackend),
            Self::Regional {
                partitions,
                region_shift,
            } => Box::new(RegionalBackend::new(partitions, region_shift)),
        }
    }
}

/// Runtime configuration shared across the engine and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub backend: BackendKind,
    /// Length of one scheduling unit.
    pub tick: Duration,
    pub magic: MagicSettings,
    pub autosave_interval_ticks: u64,
    pub event_buffer_size: usize,
    /// Re-anchor an active instance's progress task when it crosses domains.
    pub rebind_moving_instances: bool,
}

impl RuntimeConfig {
    pub const DEFAULT_TICK: Duration = Duration::from_millis(50);
    pub const DEFAULT_AUTOSAVE_INTERVAL_TICKS: u64 = 1200;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SPELL_BACKEND` - `classic` or `regional` (default: classic)
    /// - `SPELL_REGION_PARTITIONS` - Region domains for the regional backend (default: 4)
    /// - `SPELL_REGION_SHIFT` - Region size as a power of two in chunks (default: 3)
    /// - `SPELL_TICK_MS` - Scheduling unit in milliseconds (default: 50)
    /// - `MAGIC_MAX` - Magic pool bound (default: 100)
    /// - `MAGIC_REGEN_INTERVAL` - Ticks between regeneration passes (default: 40)
    /// - `MAGIC_REGEN_AMOUNT` - Base regeneration per pass (default: 2)
    /// - `AUTOSAVE_INTERVAL` - Ticks between auto-saves (default: 1200)
    /// - `EVENT_BUFFER_SIZE` - Per-topic event capacity (default: 100)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment overrides on top of `self`. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        let partitions = read_env::<usize>("SPELL_REGION_PARTITIONS");
        let shift = read_env::<u32>("SPELL_REGION_SHIFT");

        match env::var("SPELL_BACKEND").ok().as_deref().map(str::trim) {
            Some(kind) if kind.eq_ignore_ascii_case("regional") => {
                self.backend = BackendKind::Regional {
                    partitions: partitions.unwrap_or(4).max(1),
                    region_shift: shift.unwrap_or(BackendKind::DEFAULT_REGION_SHIFT),
                };
            }
            Some(kind) if kind.eq_ignore_ascii_case("classic") => {
                self.backend = BackendKind::Classic;
            }
            _ => {
                if let BackendKind::Regional {
                    partitions: p,
                    region_shift: s,
                } = &mut self.backend
                {
                    *p = partitions.unwrap_or(*p).max(1);
                    *s = shift.unwrap_or(*s);
                }
            }
        }

        if let Some(ms) = read_env::<u64>("SPELL_TICK_MS") {
            self.tick = Duration::from_millis(ms.max(1));
        }
        if let Some(max) = read_env::<u32>("MAGIC_MAX") {
            self.magic.max_magic = max;
        }
        if let Some(interval) = read_env::<u64>("MAGIC_REGEN_INTERVAL") {
            self.magic.regen_interval_ticks = interval.max(1);
        }
        if let Some(amount) = read_env::<u32>("MAGIC_REGEN_AMOUNT") {
            self.magic.regen_amount = amount;
        }
        if let Some(interval) = read_env::<u64>("AUTOSAVE_INTERVAL") {
            self.autosave_interval_ticks = interval.max(1);
        }
        if let Some(capacity) = read_env::<usize>("EVENT_BUFFER_SIZE") {
            self.event_buffer_size = capacity.max(1);
        }

        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            tick: Self::DEFAULT_TICK,
            magic: MagicSettings::default(),
            autosave_interval_ticks: Self::DEFAULT_AUTOSAVE_INTERVAL_TICKS,
            event_buffer_size: 100,
            rebind_moving_instances: true,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.trim().parse().ok()
}
