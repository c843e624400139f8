//! Cooperative cancellation for running tasks.

mod token;

pub use token::CancellationToken;
