//! Input file descriptors handed to the stage by the orchestrator.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file made available to this stage.
///
/// `display_name` is the logical identity (`$MFT`, `$J`, `.openrelik-config`)
/// and is matched exactly, case-sensitive. `path` is owned by the
/// orchestrator and only ever read or hard-linked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFile {
    /// Filesystem location of the file.
    pub path: PathBuf,

    /// Logical name used for routing and output naming.
    pub display_name: String,

    /// Classification tag assigned upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    /// MIME type assigned upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Orchestrator identifier of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,

    /// File extension without the leading dot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Path of the file on the system it was collected from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
}

impl InputFile {
    /// Creates a new input descriptor.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, display_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
            data_type: None,
            mime_type: None,
            uuid: None,
            extension: None,
            original_path: None,
        }
    }

    /// Sets the data type.
    #[must_use]
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// Sets the MIME type.
    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Sets the orchestrator uuid.
    #[must_use]
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Returns the input path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the base filename of the input path.
    ///
    /// Falls back to the display name when the path has no final component.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.display_name.clone(), |n| n.to_string_lossy().into_owned())
    }

    /// Returns true if the display name equals `name` exactly.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.display_name == name
    }
}
