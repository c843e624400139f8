//! Output file descriptors produced by the stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Data type tag for MFTECmd CSV output.
pub const MFTECMD_DATA_TYPE: &str = "openrelik:mftecmd:mftecmd";

/// Data type tag for a passed-through `.openrelik-config` file.
pub const CONFIG_PASSTHROUGH_DATA_TYPE: &str = "openrelik:openrelik-config:openrelik-config";

/// A file produced (or passed through) by this stage.
///
/// The path is assigned by the [`OutputAllocator`](crate::collector::OutputAllocator)
/// and belongs to the orchestrator once the result is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFile {
    /// Unique identifier, also the stem of the allocated filename.
    pub uuid: String,

    /// Logical name shown to users.
    pub display_name: String,

    /// Fixed tag identifying what produced the file.
    pub data_type: String,

    /// Allocated filesystem location.
    pub path: PathBuf,

    /// File extension without the leading dot.
    #[serde(default)]
    pub extension: String,

    /// Original path carried over from the source input, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,

    /// Uuid of the input this output was derived from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file_id: Option<String>,
}

impl OutputFile {
    /// Returns true if this is a passthrough of the config marker.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        self.data_type == CONFIG_PASSTHROUGH_DATA_TYPE
    }
}
