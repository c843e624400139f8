//! Error types for the MFTECmd worker stage.
//!
//! Marker problems are recovered inside the hostname resolver and never
//! leave it as a [`WorkerError`]. Everything else propagates to the task
//! queue, which is responsible for marking the task failed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The main error type for worker operations.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The staging directory could not be created or populated.
    #[error("Staging failed at {}: {source}", path.display())]
    Staging {
        /// The path being created or linked.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The external tool could not be launched.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The external tool terminated unsuccessfully.
    #[error("{program} failed on '{display_name}' (exit code: {})", exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    ToolFailed {
        /// The program that failed.
        program: String,
        /// The input being processed.
        display_name: String,
        /// The exit code, or `None` if killed by a signal.
        exit_code: Option<i32>,
    },

    /// The external tool exceeded the configured timeout.
    #[error("{program} timed out after {timeout_secs}s on '{display_name}'")]
    Timeout {
        /// The program that timed out.
        program: String,
        /// The input being processed.
        display_name: String,
        /// The timeout in seconds.
        timeout_secs: f64,
    },

    /// The task was cancelled while the tool was running.
    #[error("Task cancelled: {0}")]
    Cancelled(String),

    /// A passthrough or output file could not be materialized.
    #[error("Output error for '{display_name}': {source}")]
    Output {
        /// The output display name.
        display_name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// No handler is registered under the requested task name.
    #[error("Task not registered: {0}")]
    TaskNotFound(String),

    /// The request or a piped result could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    /// Creates a staging error.
    #[must_use]
    pub fn staging(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Staging {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates a tool failure error.
    #[must_use]
    pub fn tool_failed(
        program: impl Into<String>,
        display_name: impl Into<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ToolFailed {
            program: program.into(),
            display_name: display_name.into(),
            exit_code,
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(
        program: impl Into<String>,
        display_name: impl Into<String>,
        timeout_secs: f64,
    ) -> Self {
        Self::Timeout {
            program: program.into(),
            display_name: display_name.into(),
            timeout_secs,
        }
    }

    /// Creates an output error.
    #[must_use]
    pub fn output(display_name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Output {
            display_name: display_name.into(),
            source,
        }
    }

    /// Returns a short machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Staging { .. } => "StagingError",
            Self::Spawn { .. } => "SpawnError",
            Self::ToolFailed { .. } => "ToolFailed",
            Self::Timeout { .. } => "ToolTimeout",
            Self::Cancelled(_) => "Cancelled",
            Self::Output { .. } => "OutputError",
            Self::TaskNotFound(_) => "TaskNotFound",
            Self::Serialization(_) => "SerializationError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
        }
    }

    /// Converts to a dictionary representation for the orchestrator.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));

        match self {
            Self::ToolFailed {
                program,
                display_name,
                exit_code,
            } => {
                map.insert("program".to_string(), serde_json::json!(program));
                map.insert("display_name".to_string(), serde_json::json!(display_name));
                map.insert("exit_code".to_string(), serde_json::json!(exit_code));
            }
            Self::Timeout {
                program,
                display_name,
                timeout_secs,
            } => {
                map.insert("program".to_string(), serde_json::json!(program));
                map.insert("display_name".to_string(), serde_json::json!(display_name));
                map.insert("timeout_seconds".to_string(), serde_json::json!(timeout_secs));
            }
            Self::Staging { path, .. } => {
                map.insert("path".to_string(), serde_json::json!(path.display().to_string()));
            }
            _ => {}
        }

        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}

/// Errors raised while reading a hostname marker.
///
/// These never abort the stage; the resolver logs them and falls back to
/// an empty prefix.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// The marker could not be read.
    #[error("Error reading {name}: {source}")]
    Read {
        /// The marker display name.
        name: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The structured marker is not valid YAML.
    #[error("{name} is not a valid YAML file: {source}")]
    InvalidYaml {
        /// The marker display name.
        name: String,
        /// The YAML parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// The structured marker has no usable `hostname` key.
    #[error("No 'hostname' key found in {name} file")]
    MissingHostname {
        /// The marker display name.
        name: String,
    },

    /// The marker is present but its hostname is blank.
    #[error("{name} contains an empty hostname")]
    EmptyHostname {
        /// The marker display name.
        name: String,
    },
}
