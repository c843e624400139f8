//! Events emitted to the orchestrator while the task runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event type of the liveness heartbeat.
pub const HEARTBEAT_EVENT: &str = "task-progress";

/// Event type emitted before a file is handed to the tool.
pub const FILE_STARTED_EVENT: &str = "mftecmd.file.started";

/// Event type emitted after the tool exits for a file.
pub const FILE_COMPLETED_EVENT: &str = "mftecmd.file.completed";

/// An event emitted by the task during execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvent {
    /// The event type (e.g., "task-progress").
    #[serde(rename = "type")]
    pub event_type: String,

    /// When the event occurred (RFC 3339).
    pub timestamp: String,

    /// The event payload data.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

impl TaskEvent {
    /// Creates a new event with no data.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: HashMap::new(),
        }
    }

    /// Adds a data field to the event.
    #[must_use]
    pub fn add_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Returns the payload handed to sinks, `None` when there is no data.
    #[must_use]
    pub fn payload(&self) -> Option<serde_json::Value> {
        if self.data.is_empty() {
            None
        } else {
            let map: serde_json::Map<String, serde_json::Value> =
                self.data.clone().into_iter().collect();
            Some(serde_json::Value::Object(map))
        }
    }

    /// Creates a heartbeat. Heartbeats never carry a payload.
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::new(HEARTBEAT_EVENT)
    }

    /// Creates a "file started" event.
    #[must_use]
    pub fn file_started(display_name: &str) -> Self {
        Self::new(FILE_STARTED_EVENT).add_data("display_name", serde_json::json!(display_name))
    }

    /// Creates a "file completed" event.
    #[must_use]
    pub fn file_completed(display_name: &str, exit_code: Option<i32>, duration_ms: f64) -> Self {
        Self::new(FILE_COMPLETED_EVENT)
            .add_data("display_name", serde_json::json!(display_name))
            .add_data("exit_code", serde_json::json!(exit_code))
            .add_data("duration_ms", serde_json::json!(duration_ms))
    }
}
