//! Output descriptor allocation and accumulation.

use crate::core::{InputFile, OutputFile, TaskResult, CONFIG_PASSTHROUGH_DATA_TYPE, MFTECMD_DATA_TYPE};
use crate::errors::WorkerError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Allocates output file descriptors.
///
/// The allocator owns path assignment; callers rely on every returned path
/// being unique and not yet existing.
#[cfg_attr(test, mockall::automock)]
pub trait OutputAllocator: Send + Sync {
    /// Allocates a descriptor under `output_path`.
    fn allocate(
        &self,
        output_path: &Path,
        display_name: &str,
        data_type: &str,
    ) -> Result<OutputFile, WorkerError>;
}

/// Allocates `<output_path>/<uuid>[.<ext>]`, with the extension taken from
/// the display name.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidOutputAllocator;

impl OutputAllocator for UuidOutputAllocator {
    fn allocate(
        &self,
        output_path: &Path,
        display_name: &str,
        data_type: &str,
    ) -> Result<OutputFile, WorkerError> {
        let uuid = Uuid::new_v4().simple().to_string();
        let extension = Path::new(display_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let filename = if extension.is_empty() {
            uuid.clone()
        } else {
            format!("{uuid}.{extension}")
        };

        Ok(OutputFile {
            path: output_path.join(filename),
            uuid,
            display_name: display_name.to_string(),
            data_type: data_type.to_string(),
            extension,
            original_path: None,
            source_file_id: None,
        })
    }
}

/// Returns the display name of the CSV produced for `display_name`.
#[must_use]
pub fn output_display_name(prefix: &str, display_name: &str, tool_name: &str) -> String {
    format!("{prefix}{display_name}_{tool_name}_output.csv")
}

fn with_source(mut output: OutputFile, source: &InputFile) -> OutputFile {
    output.source_file_id = source.uuid.clone();
    output.original_path = source.original_path.clone();
    output
}

/// Accumulates the outputs of one task invocation in production order.
pub struct OutputCollector {
    allocator: Arc<dyn OutputAllocator>,
    output_path: PathBuf,
    prefix: String,
    tool_name: String,
    outputs: Vec<OutputFile>,
}

impl OutputCollector {
    /// Creates a collector writing under `output_path`.
    #[must_use]
    pub fn new(
        allocator: Arc<dyn OutputAllocator>,
        output_path: impl Into<PathBuf>,
        prefix: impl Into<String>,
        tool_name: impl Into<String>,
    ) -> Self {
        Self {
            allocator,
            output_path: output_path.into(),
            prefix: prefix.into(),
            tool_name: tool_name.into(),
            outputs: Vec::new(),
        }
    }

    /// Returns the output directory.
    #[must_use]
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Returns the hostname prefix applied to output names.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the outputs recorded so far.
    #[must_use]
    pub fn outputs(&self) -> &[OutputFile] {
        &self.outputs
    }

    /// Allocates the CSV descriptor for `input` without recording it.
    pub fn allocate_for(&self, input: &InputFile) -> Result<OutputFile, WorkerError> {
        let display_name = output_display_name(&self.prefix, &input.display_name, &self.tool_name);
        let output = self
            .allocator
            .allocate(&self.output_path, &display_name, MFTECMD_DATA_TYPE)?;
        Ok(with_source(output, input))
    }

    /// Records a finished output.
    pub fn record(&mut self, output: OutputFile) {
        debug!(display_name = %output.display_name, path = %output.path.display(), "Recorded output");
        self.outputs.push(output);
    }

    /// Passes the config marker through as an output.
    ///
    /// The marker is hard-linked to the allocated path; the original stays
    /// where it is.
    pub fn passthrough(&mut self, marker: &InputFile) -> Result<(), WorkerError> {
        let output = self.allocator.allocate(
            &self.output_path,
            &marker.display_name,
            CONFIG_PASSTHROUGH_DATA_TYPE,
        )?;
        let output = with_source(output, marker);
        std::fs::hard_link(marker.path(), &output.path)
            .map_err(|e| WorkerError::output(&marker.display_name, e))?;
        self.record(output);
        Ok(())
    }

    /// Consumes the collector into the task result.
    #[must_use]
    pub fn finish(self, workflow_id: Option<String>, command: impl Into<String>) -> TaskResult {
        TaskResult::new(self.outputs, workflow_id, command)
    }
}

impl std::fmt::Debug for OutputCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCollector")
            .field("output_path", &self.output_path)
            .field("prefix", &self.prefix)
            .field("output_count", &self.outputs.len())
            .finish_non_exhaustive()
    }
}
