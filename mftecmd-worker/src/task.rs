//! The MFTECmd task: stage inputs, run the tool per file, collect outputs.

use crate::collector::{OutputAllocator, OutputCollector, UuidOutputAllocator};
use crate::config::{StageConfig, ToolFailurePolicy};
use crate::context::TaskContext;
use crate::core::{InputFile, TaskEvent, TaskResult};
use crate::correlation::correlate;
use crate::errors::WorkerError;
use crate::invocation::InvocationBuilder;
use crate::markers::{find_config_marker, resolve_prefix};
use crate::observability::TaskSpanTimer;
use crate::process::SupervisedRunner;
use crate::registry::{CompatibleInputs, TaskHandler, TaskMetadata};
use crate::selection::{resolve_inputs, select_eligible};
use crate::staging::StagingArea;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

/// Name under which the task is registered with the orchestrator.
pub const TASK_NAME: &str = "openrelik-worker-mftecmd.tasks.mftecmd";

/// Static description of the MFTECmd task.
pub const MFTECMD_METADATA: TaskMetadata = TaskMetadata {
    display_name: "Eric Zimmerman's MFTECmd",
    description: "Runs Eric Zimmerman's MFTECmd application on MFT files",
    compatible_inputs: CompatibleInputs {
        data_types: &[],
        mime_types: &["application/octet-stream", "text/plain"],
        filenames: &[
            "$Boot",
            "$I30",
            "INDX",
            "$UsnJrnl%3A$J",
            "$J",
            "UsnJrnl-J",
            "$MFT",
            "$Secure_$SDS",
            "$Secure%3A$SDS",
            "$LogFile",
            ".openrelik-config",
        ],
    },
};

/// One task invocation as delivered by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Base64-encoded result of an upstream task.
    #[serde(default)]
    pub pipe_result: Option<String>,
    /// Explicit inputs, used when no upstream result is piped in.
    #[serde(default)]
    pub input_files: Option<Vec<InputFile>>,
    /// Directory outputs and the staging directory are created in.
    pub output_path: PathBuf,
    /// Opaque workflow identifier echoed into the result.
    #[serde(default)]
    pub workflow_id: Option<String>,
    /// User-supplied task options; carried but not interpreted.
    #[serde(default)]
    pub task_config: Option<HashMap<String, serde_json::Value>>,
}

impl TaskRequest {
    /// Creates a request with explicit inputs.
    #[must_use]
    pub fn new(output_path: impl Into<PathBuf>, input_files: Vec<InputFile>) -> Self {
        Self {
            input_files: Some(input_files),
            output_path: output_path.into(),
            ..Self::default()
        }
    }

    /// Sets the workflow id.
    #[must_use]
    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    /// Sets the piped upstream result.
    #[must_use]
    pub fn with_pipe_result(mut self, pipe_result: impl Into<String>) -> Self {
        self.pipe_result = Some(pipe_result.into());
        self
    }
}

/// Runs MFTECmd over every eligible input of a request.
pub struct MftecmdTask {
    config: StageConfig,
    allocator: Arc<dyn OutputAllocator>,
}

impl MftecmdTask {
    /// Creates the task with the default output allocator.
    #[must_use]
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            allocator: Arc::new(UuidOutputAllocator),
        }
    }

    /// Replaces the output allocator.
    #[must_use]
    pub fn with_allocator(mut self, allocator: Arc<dyn OutputAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    /// Returns the stage configuration.
    #[must_use]
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Executes the task.
    ///
    /// Inputs are processed one at a time in request order. The staging
    /// directory is removed on every exit path, including errors.
    pub async fn execute(&self, ctx: &TaskContext, request: TaskRequest) -> Result<TaskResult, WorkerError> {
        let TaskRequest {
            pipe_result,
            input_files,
            output_path,
            workflow_id,
            task_config: _,
        } = request;

        let inputs = resolve_inputs(pipe_result.as_deref(), input_files)?;
        let eligible = select_eligible(&inputs);
        if eligible.is_empty() {
            info!(input_count = inputs.len(), "No eligible input files");
            return Ok(TaskResult::empty(workflow_id));
        }

        let prefix = resolve_prefix(&inputs);
        let mut collector =
            OutputCollector::new(self.allocator.clone(), &output_path, prefix, &self.config.tool.name);
        if let Some(marker) = find_config_marker(&inputs) {
            if let Err(e) = collector.passthrough(marker) {
                warn!(
                    display_name = %marker.display_name,
                    error = %e,
                    "Failed to pass config marker through, skipping"
                );
            }
        }

        let mut staging = StagingArea::create(&output_path)?;
        for input in &eligible {
            staging.link(input)?;
        }

        let builder = InvocationBuilder::new(self.config.tool.clone());
        let runner = SupervisedRunner::from_config(&self.config);
        let mut command = String::new();

        for input in eligible {
            let mft = correlate(input, &inputs);
            let output = collector.allocate_for(input)?;
            let invocation = builder.build(input.path(), &output_path, &output.path, mft);
            command = invocation.command_line();

            info!(
                display_name = %input.display_name,
                enriched = mft.is_some(),
                "Running {}", self.config.tool.name
            );
            ctx.emit(&TaskEvent::file_started(&input.display_name));
            let timer = TaskSpanTimer::start(&input.display_name);
            let outcome = runner.run(&invocation, &input.display_name, ctx).await?;
            let duration_ms = timer.finish();
            ctx.emit(&TaskEvent::file_completed(
                &input.display_name,
                outcome.exit_code(),
                duration_ms,
            ));

            if outcome.success() {
                collector.record(output);
                continue;
            }

            match self.config.failure_policy {
                ToolFailurePolicy::Fail => {
                    return Err(WorkerError::tool_failed(
                        invocation.program(),
                        &input.display_name,
                        outcome.exit_code(),
                    ));
                }
                ToolFailurePolicy::SkipOutput => {
                    warn!(
                        display_name = %input.display_name,
                        exit_code = ?outcome.exit_code(),
                        "Tool failed, dropping output"
                    );
                }
                ToolFailurePolicy::Permissive => {
                    warn!(
                        display_name = %input.display_name,
                        exit_code = ?outcome.exit_code(),
                        "Tool failed, keeping output"
                    );
                    collector.record(output);
                }
            }
        }

        let staging_dir = staging.root().to_path_buf();
        if let Err(e) = staging.cleanup() {
            warn!(staging_dir = %staging_dir.display(), error = %e, "Failed to remove staging directory");
        }

        let result = collector.finish(workflow_id, command);
        info!(output_count = result.output_files.len(), "Task completed");
        Ok(result)
    }
}

impl std::fmt::Debug for MftecmdTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MftecmdTask")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TaskHandler for MftecmdTask {
    fn metadata(&self) -> &TaskMetadata {
        &MFTECMD_METADATA
    }

    async fn run(&self, ctx: &TaskContext, request: TaskRequest) -> Result<TaskResult, WorkerError> {
        let span = ctx.span();
        self.execute(ctx, request).instrument(span).await
    }
}
