//! Per-invocation context passed explicitly into task handlers.

mod execution;
mod identity;

pub use execution::TaskContext;
pub use identity::TaskIdentity;
