//! Background workers that keep caster state moving between casts.
//!
//! Both workers are periodic scheduler tasks rather than free-standing tokio
//! tasks, so they obey the same affinity rules and shutdown as everything
//! else: regeneration runs on the global domain and fans out to each caster's
//! entity domain, auto-save runs on the async pool.

mod autosave;
mod regen;

pub(crate) use autosave::AutosaveWorker;
pub(crate) use regen::RegenWorker;
