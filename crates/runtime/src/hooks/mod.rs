//! Pre-cast interceptors.
//!
//! Interceptors run after the admission checks pass and before the spell
//! executes. Each one sees the caster, the definition and the effective magic
//! cost, and may change the cost or veto the cast.
//!
//! # Execution Order
//!
//! Interceptors are sorted by priority (lower values run first). The first
//! interceptor that cancels ends the chain; later ones never see the cast.

mod context;
mod registry;

pub use context::PreCast;
pub use registry::InterceptorRegistry;

/// Observer that may adjust or veto a cast before it executes.
pub trait CastInterceptor: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &'static str;

    /// Lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    fn before_cast(&self, cast: &mut PreCast<'_>);
}
