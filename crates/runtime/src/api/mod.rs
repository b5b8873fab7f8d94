//! Public API surface consumed by embedders of the runtime.
mod errors;

pub use errors::{Result, RuntimeError};
