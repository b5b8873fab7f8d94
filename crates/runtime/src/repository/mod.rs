//! Persistence of caster records.
//!
//! Repositories are synchronous and `Send + Sync`; asynchronous saves are
//! expressed by dispatching a synchronous save on the async affinity.

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileCasterRepo;
pub use memory::InMemoryCasterRepo;
pub use traits::CasterRepository;
