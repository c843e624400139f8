//! Stage configuration.
//!
//! Values come from defaults, then an optional YAML file, then
//! `MFTECMD_*` environment overrides.

use crate::errors::WorkerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the tool program.
pub const ENV_PROGRAM: &str = "MFTECMD_PROGRAM";
/// Environment variable overriding the MFTECmd DLL path.
pub const ENV_DLL: &str = "MFTECMD_DLL";
/// Environment variable overriding the heartbeat interval in seconds.
pub const ENV_HEARTBEAT_SECS: &str = "MFTECMD_HEARTBEAT_SECS";
/// Environment variable setting a process timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "MFTECMD_TIMEOUT_SECS";
/// Environment variable overriding the failure policy.
pub const ENV_FAILURE_POLICY: &str = "MFTECMD_FAILURE_POLICY";

/// What to do when the external tool exits unsuccessfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolFailurePolicy {
    /// Fail the whole task.
    #[default]
    Fail,
    /// Drop the output descriptor for that file and continue.
    SkipOutput,
    /// Keep the output descriptor and continue.
    Permissive,
}

impl std::str::FromStr for ToolFailurePolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "skip_output" | "skip" => Ok(Self::SkipOutput),
            "permissive" | "ignore" => Ok(Self::Permissive),
            other => Err(WorkerError::Config(format!("unknown failure policy '{other}'"))),
        }
    }
}

/// How to launch the external analysis tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Program to execute.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the per-file flags.
    #[serde(default = "default_entry_args")]
    pub entry_args: Vec<String>,
    /// Short tool name used in output display names.
    #[serde(default = "default_tool_name")]
    pub name: String,
}

fn default_program() -> String {
    "dotnet".to_string()
}

fn default_entry_args() -> Vec<String> {
    vec!["/mftecmd/MFTECmd.dll".to_string()]
}

fn default_tool_name() -> String {
    "MFTECmd".to_string()
}

impl Default for ToolSpec {
    fn default() -> Self {
        Self {
            program: default_program(),
            entry_args: default_entry_args(),
            name: default_tool_name(),
        }
    }
}

impl ToolSpec {
    /// Creates a tool spec with a program and no entry arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            entry_args: Vec::new(),
            name: default_tool_name(),
        }
    }

    /// Sets the entry arguments.
    #[must_use]
    pub fn with_entry_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_args = args.into_iter().map(Into::into).collect();
        self
    }
}

/// Configuration for the MFTECmd stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// External tool invocation.
    #[serde(default)]
    pub tool: ToolSpec,
    /// Heartbeat interval in seconds.
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: f64,
    /// Per-process timeout in seconds; none waits indefinitely.
    #[serde(default)]
    pub process_timeout_secs: Option<f64>,
    /// Handling of unsuccessful tool exits.
    #[serde(default)]
    pub failure_policy: ToolFailurePolicy,
}

fn default_heartbeat_secs() -> f64 {
    2.0
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            tool: ToolSpec::default(),
            heartbeat_interval_secs: default_heartbeat_secs(),
            process_timeout_secs: None,
            failure_policy: ToolFailurePolicy::default(),
        }
    }
}

impl StageConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tool spec.
    #[must_use]
    pub fn with_tool(mut self, tool: ToolSpec) -> Self {
        self.tool = tool;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval_secs = interval.as_secs_f64();
        self
    }

    /// Sets the process timeout.
    #[must_use]
    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    /// Sets the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: ToolFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Returns the heartbeat interval, never shorter than 10ms.
    ///
    /// A value that does not fit a `Duration` falls back to the default;
    /// [`StageConfig::validate`] rejects such values up front.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.heartbeat_interval_secs.max(MIN_HEARTBEAT_SECS))
            .unwrap_or_else(|_| Duration::from_secs_f64(default_heartbeat_secs()))
    }

    /// Returns the process timeout, if any.
    ///
    /// Zero, negative and unrepresentable values mean no timeout.
    #[must_use]
    pub fn process_timeout(&self) -> Option<Duration> {
        self.process_timeout_secs
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }

    /// Checks that every duration field is representable.
    pub fn validate(&self) -> Result<(), WorkerError> {
        check_secs("heartbeat_interval_secs", self.heartbeat_interval_secs)?;
        if let Some(secs) = self.process_timeout_secs {
            check_secs("process_timeout_secs", secs)?;
        }
        Ok(())
    }

    /// Parses and validates a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, WorkerError> {
        let config: Self = serde_yaml::from_str(text).map_err(|e| WorkerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads defaults, an optional YAML file and environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, WorkerError> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| WorkerError::Config(format!("{}: {e}", p.display())))?;
                Self::from_yaml(&text)?
            }
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `MFTECMD_*` overrides from a lookup function.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, WorkerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(program) = lookup(ENV_PROGRAM) {
            self.tool.program = program;
        }
        if let Some(dll) = lookup(ENV_DLL) {
            self.tool.entry_args = vec![dll];
        }
        if let Some(secs) = lookup(ENV_HEARTBEAT_SECS) {
            self.heartbeat_interval_secs = parse_secs(ENV_HEARTBEAT_SECS, &secs)?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.process_timeout_secs = Some(parse_secs(ENV_TIMEOUT_SECS, &secs)?);
        }
        if let Some(policy) = lookup(ENV_FAILURE_POLICY) {
            self.failure_policy = policy.parse()?;
        }
        self.validate()?;
        Ok(self)
    }
}

const MIN_HEARTBEAT_SECS: f64 = 0.01;

fn parse_secs(key: &str, value: &str) -> Result<f64, WorkerError> {
    let secs = value
        .trim()
        .parse::<f64>()
        .map_err(|_| WorkerError::Config(format!("{key} must be a non-negative number, got '{value}'")))?;
    check_secs(key, secs)?;
    Ok(secs)
}

fn check_secs(key: &str, secs: f64) -> Result<(), WorkerError> {
    if secs < 0.0 || Duration::try_from_secs_f64(secs).is_err() {
        return Err(WorkerError::Config(format!(
            "{key} must be a non-negative number of seconds that fits a duration, got {secs}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StageConfig::default();
        assert_eq!(config.tool.program, "dotnet");
        assert_eq!(config.tool.entry_args, vec!["/mftecmd/MFTECmd.dll"]);
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(2));
        assert!(config.process_timeout().is_none());
        assert_eq!(config.failure_policy, ToolFailurePolicy::Fail);
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = StageConfig::from_yaml(
            "heartbeat_interval_secs: 0.5\nfailure_policy: skip_output\ntool:\n  program: /opt/mftecmd\n",
        )
        .unwrap();

        assert_eq!(config.tool.program, "/opt/mftecmd");
        assert_eq!(config.tool.entry_args, vec!["/mftecmd/MFTECmd.dll"]);
        assert_eq!(config.heartbeat_interval(), Duration::from_millis(500));
        assert_eq!(config.failure_policy, ToolFailurePolicy::SkipOutput);
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = StageConfig::from_yaml("heartbeat_interval_secs: [").unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_PROGRAM, "/usr/bin/dotnet"),
            (ENV_DLL, "/srv/MFTECmd.dll"),
            (ENV_TIMEOUT_SECS, "600"),
            (ENV_FAILURE_POLICY, "permissive"),
        ]
        .into_iter()
        .collect();

        let config = StageConfig::default()
            .with_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.tool.program, "/usr/bin/dotnet");
        assert_eq!(config.tool.entry_args, vec!["/srv/MFTECmd.dll"]);
        assert_eq!(config.process_timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.failure_policy, ToolFailurePolicy::Permissive);
    }

    #[test]
    fn test_override_rejects_bad_number() {
        let err = StageConfig::default()
            .with_overrides(|k| (k == ENV_HEARTBEAT_SECS).then(|| "fast".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_HEARTBEAT_SECS));
    }

    #[test]
    fn test_from_yaml_rejects_infinite_heartbeat() {
        let err = StageConfig::from_yaml("heartbeat_interval_secs: .inf").unwrap_err();
        assert!(matches!(err, WorkerError::Config(ref msg) if msg.contains("heartbeat_interval_secs")));
    }

    #[test]
    fn test_from_yaml_rejects_nan_timeout() {
        let err = StageConfig::from_yaml("process_timeout_secs: .nan").unwrap_err();
        assert!(matches!(err, WorkerError::Config(_)));
    }

    #[test]
    fn test_override_rejects_oversized_timeout() {
        let err = StageConfig::default()
            .with_overrides(|k| (k == ENV_TIMEOUT_SECS).then(|| "1e20".to_string()))
            .unwrap_err();
        assert!(matches!(err, WorkerError::Config(ref msg) if msg.contains(ENV_TIMEOUT_SECS)));
    }

    #[test]
    fn test_accessors_never_panic_on_unchecked_values() {
        let config = StageConfig {
            heartbeat_interval_secs: f64::INFINITY,
            process_timeout_secs: Some(1e20),
            ..StageConfig::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(2));
        assert!(config.process_timeout().is_none());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config = StageConfig {
            process_timeout_secs: Some(0.0),
            ..StageConfig::default()
        };
        assert!(config.process_timeout().is_none());
    }

    #[test]
    fn test_failure_policy_parse() {
        assert_eq!("FAIL".parse::<ToolFailurePolicy>().unwrap(), ToolFailurePolicy::Fail);
        assert_eq!("skip".parse::<ToolFailurePolicy>().unwrap(), ToolFailurePolicy::SkipOutput);
        assert!("retry".parse::<ToolFailurePolicy>().is_err());
    }
}
