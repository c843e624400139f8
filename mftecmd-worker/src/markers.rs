//! Hostname marker files and the output name prefix derived from them.
//!
//! A batch may carry a small sidecar naming the host the artifacts came
//! from: either a plain-text marker holding just the hostname, or the
//! structured `.openrelik-config` YAML with a `hostname` key. Markers are
//! never handed to MFTECmd. The structured marker is additionally passed
//! through as an output (see [`crate::collector::OutputCollector::passthrough`]).

use crate::core::InputFile;
use crate::errors::MarkerError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, error, info};

/// Display names of plain-text hostname markers.
pub const PLAIN_HOSTNAME_MARKERS: &[&str] = &[".hostname-marker", ".openrelik-hostname"];

/// Display name of the structured configuration marker.
pub const CONFIG_MARKER: &str = ".openrelik-config";

/// Separator appended to a non-empty hostname prefix.
pub const PREFIX_SEPARATOR: char = '_';

#[allow(clippy::expect_used)]
static INVALID_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[\x00-\x1f\x7f/\\:*?"<>|]"#).expect("static pattern")
});

/// Returns true if `display_name` names any recognized marker.
#[must_use]
pub fn is_marker(display_name: &str) -> bool {
    display_name == CONFIG_MARKER || PLAIN_HOSTNAME_MARKERS.contains(&display_name)
}

/// Returns the structured config marker in the batch, if present.
#[must_use]
pub fn find_config_marker(inputs: &[InputFile]) -> Option<&InputFile> {
    inputs.iter().find(|f| f.is_named(CONFIG_MARKER))
}

/// Returns the first plain-text hostname marker in the batch, if present.
#[must_use]
pub fn find_plain_marker(inputs: &[InputFile]) -> Option<&InputFile> {
    inputs
        .iter()
        .find(|f| PLAIN_HOSTNAME_MARKERS.contains(&f.display_name.as_str()))
}

/// Makes a hostname safe to embed in a filename.
///
/// Path separators, reserved characters and control characters are
/// removed; surrounding whitespace and trailing dots are trimmed.
#[must_use]
pub fn sanitize_hostname(raw: &str) -> String {
    let cleaned = INVALID_FILENAME_CHARS.replace_all(raw, "");
    cleaned.trim().trim_end_matches('.').trim_end().to_string()
}

/// Reads the hostname from a plain-text marker.
pub fn read_plain_hostname(marker: &InputFile) -> Result<String, MarkerError> {
    let text = std::fs::read_to_string(&marker.path).map_err(|source| MarkerError::Read {
        name: marker.display_name.clone(),
        source,
    })?;
    non_empty(marker, text.trim())
}

/// Reads the `hostname` key from the structured config marker.
pub fn read_config_hostname(marker: &InputFile) -> Result<String, MarkerError> {
    let text = std::fs::read_to_string(&marker.path).map_err(|source| MarkerError::Read {
        name: marker.display_name.clone(),
        source,
    })?;
    parse_config_hostname(&marker.display_name, &text).and_then(|h| non_empty(marker, &h))
}

fn parse_config_hostname(name: &str, text: &str) -> Result<String, MarkerError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|source| MarkerError::InvalidYaml {
            name: name.to_string(),
            source,
        })?;

    let missing = || MarkerError::MissingHostname {
        name: name.to_string(),
    };
    let hostname = value.as_mapping().and_then(|m| m.get("hostname")).ok_or_else(missing)?;

    match hostname {
        serde_yaml::Value::String(s) => Ok(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(missing()),
    }
}

fn non_empty(marker: &InputFile, hostname: &str) -> Result<String, MarkerError> {
    if hostname.is_empty() {
        Err(MarkerError::EmptyHostname {
            name: marker.display_name.clone(),
        })
    } else {
        Ok(hostname.to_string())
    }
}

/// Resolves the output name prefix for a batch.
///
/// The structured marker wins over a plain marker when both are present
/// and it yields a hostname. Every failure is logged and degrades to an
/// empty prefix.
#[must_use]
pub fn resolve_prefix(inputs: &[InputFile]) -> String {
    let from_config = find_config_marker(inputs).and_then(|m| report(m, read_config_hostname(m)));
    let hostname =
        from_config.or_else(|| find_plain_marker(inputs).and_then(|m| report(m, read_plain_hostname(m))));

    let Some(hostname) = hostname else {
        return String::new();
    };

    let sanitized = sanitize_hostname(&hostname);
    if sanitized.is_empty() {
        info!(hostname = %hostname, "Hostname sanitized to nothing, no prefix applied");
        return String::new();
    }

    debug!(prefix = %sanitized, "Resolved hostname prefix");
    format!("{sanitized}{PREFIX_SEPARATOR}")
}

fn report(marker: &InputFile, result: Result<String, MarkerError>) -> Option<String> {
    match result {
        Ok(hostname) => Some(hostname),
        Err(e @ (MarkerError::MissingHostname { .. } | MarkerError::EmptyHostname { .. })) => {
            info!(marker = %marker.display_name, "{e}");
            None
        }
        Err(e) => {
            error!(marker = %marker.display_name, "{e}");
            None
        }
    }
}
