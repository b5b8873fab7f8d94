//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from runtime orchestration, worker coordination and
//! repositories. The cast path itself never produces these: it reports
//! [`spell_core::CastOutcome`] values instead.

use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("the runtime must be built inside a tokio runtime")]
    NoAsyncRuntime(#[source] tokio::runtime::TryCurrentError),

    #[error("domain worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to schedule the {0} worker")]
    WorkerNotScheduled(&'static str),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    House(#[from] spell_core::HouseError),

    #[error(transparent)]
    Slot(#[from] spell_core::SlotError),
}
