/// Bounded magic pool.
///
/// Invariant: `0 <= current <= max` after every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MagicPool {
    current: u32,
    max: u32,
}

impl MagicPool {
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    pub fn with_current(current: u32, max: u32) -> Self {
        Self {
            current: current.min(max),
            max,
        }
    }

    pub const fn current(&self) -> u32 {
        self.current
    }

    pub const fn max(&self) -> u32 {
        self.max
    }

    /// True iff `cost` is absent or zero, or the pool covers it.
    pub fn has(&self, cost: Option<u32>) -> bool {
        match cost {
            None | Some(0) => true,
            Some(cost) => self.current >= cost,
        }
    }

    /// Subtracts `cost`, stopping at zero. Never fails.
    pub fn consume(&mut self, cost: Option<u32>) {
        self.current = self.current.saturating_sub(cost.unwrap_or(0));
    }

    /// Adds `amount`, stopping at `max`.
    pub fn regenerate(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount).min(self.max);
    }

    /// Overwrites the pool, clamped to `max`.
    pub fn set(&mut self, value: u32) {
        self.current = value.min(self.max);
    }

    /// Changes the bound, clamping the current value down if needed.
    pub fn set_max(&mut self, max: u32) {
        self.max = max;
        self.current = self.current.min(max);
    }

    /// Fill ratio in `[0, 1]`; an empty bound reads as full.
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            return 1.0;
        }
        (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
    }
}
