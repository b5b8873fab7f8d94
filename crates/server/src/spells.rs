//! Demonstration behaviours for the bundled spell catalog.
//!
//! Content files carry only metadata; these types give each catalog entry
//! something to do so the server exercises one-shot, delayed and ticking
//! spells.

use std::sync::Arc;

use spell_core::{CastOutcome, Location};
use spell_runtime::{
    Affinity, CastContext, Progress, Spell, SpellInstance, StopReason, TickContext,
};
use tracing::{debug, info, trace};

/// Picks a behaviour for a catalog entry by name.
pub fn behavior_for(name: &str) -> Arc<dyn Spell> {
    match name.to_lowercase().as_str() {
        "flamethrower" => Arc::new(Channeled {
            duration_ticks: 60,
            reach: 6.0,
        }),
        "shield" => Arc::new(Channeled {
            duration_ticks: 100,
            reach: 0.0,
        }),
        "fireball" => Arc::new(Projectile {
            travel_ticks: 10,
            distance: 16.0,
        }),
        "blink" => Arc::new(Blink { distance: 8.0 }),
        _ => Arc::new(Instant),
    }
}

/// Resolves immediately with no lasting effect.
pub struct Instant;

struct InstantCast;

impl SpellInstance for InstantCast {
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome {
        info!(
            target: "spell_server::spells",
            caster = %ctx.caster,
            spell = ctx.definition.name(),
            "spell resolved"
        );
        CastOutcome::Success
    }

    fn needs_ticking(&self) -> bool {
        false
    }
}

impl Spell for Instant {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(InstantCast)
    }
}

/// Lands a delayed impact in the region ahead of the caster.
pub struct Projectile {
    travel_ticks: u64,
    distance: f64,
}

struct ProjectileCast {
    travel_ticks: u64,
    distance: f64,
}

impl SpellInstance for ProjectileCast {
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome {
        let impact = ctx.origin.offset(self.distance, 0.0, 0.0);
        let caster = ctx.caster;
        let scheduled = ctx
            .scheduler()
            .run_later(Affinity::Region(impact), self.travel_ticks, move || {
                info!(
                    target: "spell_server::spells",
                    %caster,
                    x = impact.x,
                    z = impact.z,
                    "projectile impact"
                );
            });
        if scheduled.is_none() {
            return CastOutcome::Failure;
        }
        CastOutcome::Success
    }

    fn needs_ticking(&self) -> bool {
        false
    }
}

impl Spell for Projectile {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(ProjectileCast {
            travel_ticks: self.travel_ticks,
            distance: self.distance,
        })
    }
}

/// Moves the caster a fixed distance along +x.
pub struct Blink {
    distance: f64,
}

struct BlinkCast {
    distance: f64,
}

impl SpellInstance for BlinkCast {
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome {
        let Some(current) = ctx.locate(ctx.caster) else {
            return CastOutcome::InvalidTarget;
        };
        let destination = current.offset(self.distance, 0.0, 0.0);
        debug!(
            target: "spell_server::spells",
            caster = %ctx.caster,
            from = current.x,
            to = destination.x,
            "blink"
        );
        CastOutcome::Success
    }

    fn needs_ticking(&self) -> bool {
        false
    }
}

impl Spell for Blink {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(BlinkCast {
            distance: self.distance,
        })
    }
}

/// Stays active for a fixed number of ticks, projecting its effect `reach`
/// blocks in front of the caster.
pub struct Channeled {
    duration_ticks: u64,
    reach: f64,
}

struct ChanneledCast {
    duration_ticks: u64,
    reach: f64,
    focus: Option<Location>,
}

impl SpellInstance for ChanneledCast {
    fn execute(&mut self, ctx: &CastContext<'_>) -> CastOutcome {
        self.focus = Some(ctx.origin.offset(self.reach, 0.0, 0.0));
        CastOutcome::Success
    }

    fn progress(&mut self, ctx: &mut TickContext<'_>) -> Progress {
        self.focus = Some(ctx.caster_location.offset(self.reach, 0.0, 0.0));
        if ctx.tick % 20 == 0 {
            trace!(
                target: "spell_server::spells",
                caster = %ctx.caster,
                spell = ctx.definition.name(),
                tick = ctx.tick,
                "channeling"
            );
        }
        if ctx.tick >= self.duration_ticks {
            Progress::Stop(StopReason::Finished)
        } else {
            Progress::Continue
        }
    }

    fn on_stop(&mut self, reason: StopReason) {
        debug!(target: "spell_server::spells", %reason, "channel ended");
    }

    fn location(&self) -> Option<Location> {
        self.focus
    }
}

impl Spell for Channeled {
    fn begin(&self, _ctx: &CastContext<'_>) -> Box<dyn SpellInstance> {
        Box::new(ChanneledCast {
            duration_ticks: self.duration_ticks,
            reach: self.reach,
            focus: None,
        })
    }
}
