//! Task result record returned to the orchestrator.

use super::OutputFile;
use crate::errors::WorkerError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The record returned by the stage.
///
/// Travels between tasks as base64-encoded JSON (see [`TaskResult::encode`]),
/// which is how a downstream task receives it as `pipe_result`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Output descriptors in the order they were produced.
    #[serde(default)]
    pub output_files: Vec<OutputFile>,

    /// Workflow identifier, passed through unchanged.
    #[serde(default)]
    pub workflow_id: Option<String>,

    /// The last command line executed, for audit.
    #[serde(default)]
    pub command: String,

    /// Free-form metadata.
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,

    /// Files attached to the task itself rather than the workflow.
    #[serde(default)]
    pub task_files: Vec<OutputFile>,
}

impl TaskResult {
    /// Creates a result with the given outputs.
    #[must_use]
    pub fn new(
        output_files: Vec<OutputFile>,
        workflow_id: Option<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            output_files,
            workflow_id,
            command: command.into(),
            meta: HashMap::new(),
            task_files: Vec::new(),
        }
    }

    /// Creates an empty result carrying only the workflow id.
    #[must_use]
    pub fn empty(workflow_id: Option<String>) -> Self {
        Self::new(Vec::new(), workflow_id, "")
    }

    /// Returns true if no output files were produced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.output_files.is_empty()
    }

    /// Encodes the result as base64 JSON.
    pub fn encode(&self) -> Result<String, WorkerError> {
        let json = serde_json::to_vec(self).map_err(|e| WorkerError::Serialization(e.to_string()))?;
        Ok(STANDARD.encode(json))
    }

    /// Decodes a base64 JSON result produced by [`TaskResult::encode`].
    pub fn decode(encoded: &str) -> Result<Self, WorkerError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| WorkerError::Serialization(format!("invalid base64: {e}")))?;
        serde_json::from_slice(&bytes).map_err(|e| WorkerError::Serialization(e.to_string()))
    }
}
