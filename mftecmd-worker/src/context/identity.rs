//! Identity of a single task invocation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one task invocation for logging and events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskIdentity {
    /// Queue-assigned task id.
    pub task_id: Uuid,

    /// Registered task name the invocation was routed to.
    pub task_name: String,

    /// Human-readable worker name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_name: Option<String>,
}

impl TaskIdentity {
    /// Creates an identity with a generated task id.
    #[must_use]
    pub fn new(task_name: impl Into<String>) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            task_name: task_name.into(),
            worker_name: None,
        }
    }

    /// Sets a specific task id.
    #[must_use]
    pub fn with_task_id(mut self, task_id: Uuid) -> Self {
        self.task_id = task_id;
        self
    }

    /// Sets the worker name.
    #[must_use]
    pub fn with_worker_name(mut self, worker_name: impl Into<String>) -> Self {
        self.worker_name = Some(worker_name.into());
        self
    }
}
