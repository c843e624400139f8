//! Registry mapping task names to handlers.
//!
//! The registry is built once at start-up and handed to whatever drives
//! the worker. Registration has no import-time side effects.

use crate::config::StageConfig;
use crate::context::TaskContext;
use crate::core::TaskResult;
use crate::errors::WorkerError;
use crate::task::{MftecmdTask, TaskRequest, TASK_NAME};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Input filter advertised to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompatibleInputs {
    /// Accepted data types.
    pub data_types: &'static [&'static str],
    /// Accepted MIME types.
    pub mime_types: &'static [&'static str],
    /// Accepted display names.
    pub filenames: &'static [&'static str],
}

/// Static description of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskMetadata {
    /// Human-readable name.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Inputs the task accepts.
    pub compatible_inputs: CompatibleInputs,
}

/// A task the worker can run.
#[async_trait]
pub trait TaskHandler: Send + Sync + std::fmt::Debug {
    /// Returns the task's static metadata.
    fn metadata(&self) -> &TaskMetadata;

    /// Runs the task for one request.
    async fn run(&self, ctx: &TaskContext, request: TaskRequest) -> Result<TaskResult, WorkerError>;
}

/// Registry of task handlers keyed by task name.
#[derive(Default)]
pub struct TaskRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn TaskHandler>>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `name`, replacing any previous handler.
    pub fn register(&self, name: impl Into<String>, handler: Arc<dyn TaskHandler>) {
        let name = name.into();
        debug!(task_name = %name, "Registered task");
        self.handlers.write().insert(name, handler);
    }

    /// Returns the handler registered under `name`.
    pub fn get(&self, name: &str) -> Result<Arc<dyn TaskHandler>, WorkerError> {
        self.handlers
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| WorkerError::TaskNotFound(name.to_string()))
    }

    /// Returns true if a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    /// Lists registered task names, sorted.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the metadata of every registered task, sorted by name.
    pub fn metadata(&self) -> Vec<(String, TaskMetadata)> {
        let handlers = self.handlers.read();
        let mut entries: Vec<(String, TaskMetadata)> = handlers
            .iter()
            .map(|(name, handler)| (name.clone(), *handler.metadata()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Looks up `name` and runs it.
    ///
    /// The read lock is released before the handler runs.
    pub async fn dispatch(
        &self,
        name: &str,
        ctx: &TaskContext,
        request: TaskRequest,
    ) -> Result<TaskResult, WorkerError> {
        let handler = self.get(name)?;
        handler.run(ctx, request).await
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.list())
            .finish()
    }
}

/// Builds the registry with the MFTECmd task registered under [`TASK_NAME`].
#[must_use]
pub fn default_registry(config: StageConfig) -> TaskRegistry {
    let registry = TaskRegistry::new();
    registry.register(TASK_NAME, Arc::new(MftecmdTask::new(config)));
    registry
}
