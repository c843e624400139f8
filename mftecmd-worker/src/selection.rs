//! Input resolution and eligibility.

use crate::core::{InputFile, TaskResult};
use crate::errors::WorkerError;
use crate::markers::is_marker;

/// Resolves the batch a task should work on.
///
/// A piped result from an upstream task takes precedence: its output
/// files become this task's inputs. Otherwise the explicit input list is
/// used.
pub fn resolve_inputs(
    pipe_result: Option<&str>,
    input_files: Option<Vec<InputFile>>,
) -> Result<Vec<InputFile>, WorkerError> {
    if let Some(encoded) = pipe_result.filter(|s| !s.trim().is_empty()) {
        let upstream = TaskResult::decode(encoded)?;
        return Ok(upstream
            .output_files
            .into_iter()
            .map(|o| {
                let mut input = InputFile::new(o.path, o.display_name).with_data_type(o.data_type);
                input.uuid = Some(o.uuid);
                input.extension = Some(o.extension).filter(|e| !e.is_empty());
                input.original_path = o.original_path;
                input
            })
            .collect());
    }
    Ok(input_files.unwrap_or_default())
}

/// Returns the inputs that should be handed to the analysis tool.
///
/// Marker files are excluded; order is preserved.
#[must_use]
pub fn select_eligible(inputs: &[InputFile]) -> Vec<&InputFile> {
    inputs.iter().filter(|f| !is_marker(&f.display_name)).collect()
}
