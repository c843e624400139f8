//! Event sinks connecting the task to its orchestrator.
//!
//! The sink is always injected through the [`TaskContext`](crate::context::TaskContext);
//! there is no process-wide default.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
