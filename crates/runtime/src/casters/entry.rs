use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use spell_core::{Caster, EntityId};

/// One loaded caster plus its cast gate.
///
/// The gate serializes cast attempts: while one attempt holds it, admission,
/// execution and commit for that caster cannot interleave with another.
#[derive(Debug)]
pub struct CasterEntry {
    id: EntityId,
    state: Mutex<Caster>,
    casting: AtomicBool,
}

impl CasterEntry {
    pub(crate) fn new(caster: Caster) -> Self {
        Self {
            id: caster.id(),
            state: Mutex::new(caster),
            casting: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Locks the caster state. Hold the guard only for short, non-reentrant work.
    pub fn lock(&self) -> MutexGuard<'_, Caster> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Caster {
        self.lock().clone()
    }

    /// Takes the cast gate, or returns `None` if another cast holds it.
    pub fn try_begin_cast(&self) -> Option<CastGate<'_>> {
        self.casting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CastGate { entry: self })
    }

    pub fn is_casting(&self) -> bool {
        self.casting.load(Ordering::Acquire)
    }
}

/// Releases the cast gate on drop.
#[derive(Debug)]
pub struct CastGate<'a> {
    entry: &'a CasterEntry,
}

impl Drop for CastGate<'_> {
    fn drop(&mut self) {
        self.entry.casting.store(false, Ordering::Release);
    }
}
