//! Ordered interceptor chain.

use std::sync::Arc;

use tracing::debug;

use super::{CastInterceptor, PreCast};

/// Interceptors sorted by priority.
#[derive(Clone, Default)]
pub struct InterceptorRegistry {
    interceptors: Arc<[Arc<dyn CastInterceptor>]>,
}

impl InterceptorRegistry {
    /// Creates a registry. Interceptors are sorted by priority (lower first);
    /// equal priorities keep their registration order.
    pub fn new(mut interceptors: Vec<Arc<dyn CastInterceptor>>) -> Self {
        interceptors.sort_by_key(|interceptor| interceptor.priority());
        Self {
            interceptors: interceptors.into(),
        }
    }

    /// Runs the chain until an interceptor cancels.
    pub fn run(&self, cast: &mut PreCast<'_>) {
        for interceptor in self.interceptors.iter() {
            let before = cast.magic_cost();
            interceptor.before_cast(cast);

            if cast.magic_cost() != before {
                debug!(
                    target: "spell_runtime::hooks",
                    interceptor = interceptor.name(),
                    spell = cast.definition().name(),
                    from = ?before,
                    to = ?cast.magic_cost(),
                    "magic cost adjusted"
                );
            }
            if cast.is_cancelled() {
                debug!(
                    target: "spell_runtime::hooks",
                    interceptor = interceptor.name(),
                    spell = cast.definition().name(),
                    caster = %cast.caster().id(),
                    "cast cancelled"
                );
                return;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names and priorities in execution order.
    pub fn interceptors(&self) -> impl Iterator<Item = (&'static str, i32)> + '_ {
        self.interceptors.iter().map(|i| (i.name(), i.priority()))
    }
}
