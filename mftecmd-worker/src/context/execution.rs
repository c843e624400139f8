//! Execution context threaded through a task invocation.

use super::TaskIdentity;
use crate::cancellation::CancellationToken;
use crate::core::TaskEvent;
use crate::events::{EventSink, NoOpEventSink};
use std::sync::Arc;

/// Everything a task needs from its caller besides the request itself.
///
/// Built by the queue client per invocation and passed into the handler;
/// nothing here is global.
#[derive(Clone)]
pub struct TaskContext {
    identity: TaskIdentity,
    event_sink: Arc<dyn EventSink>,
    cancellation: Arc<CancellationToken>,
}

impl TaskContext {
    /// Creates a context with a no-op sink and a fresh cancellation token.
    #[must_use]
    pub fn new(identity: TaskIdentity) -> Self {
        Self {
            identity,
            event_sink: Arc::new(NoOpEventSink),
            cancellation: Arc::new(CancellationToken::new()),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: Arc<CancellationToken>) -> Self {
        self.cancellation = token;
        self
    }

    /// Returns the task identity.
    #[must_use]
    pub fn identity(&self) -> &TaskIdentity {
        &self.identity
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn EventSink> {
        &self.event_sink
    }

    /// Returns the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Returns true if the orchestrator asked the task to stop.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Emits an event without blocking.
    pub fn emit(&self, event: &TaskEvent) {
        self.event_sink.try_emit(&event.event_type, event.payload());
    }

    /// Emits a liveness heartbeat.
    pub fn heartbeat(&self) {
        self.emit(&TaskEvent::heartbeat());
    }

    /// Creates a tracing span carrying the task identity.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "task",
            task_id = %self.identity.task_id,
            task_name = %self.identity.task_name,
            worker_name = self.identity.worker_name.as_deref().unwrap_or(""),
        )
    }
}

impl std::fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskContext")
            .field("identity", &self.identity)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
