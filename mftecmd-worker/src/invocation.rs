//! Command-line construction for MFTECmd.
//!
//! Arguments are kept as a discrete list and handed to the OS as such;
//! no shell ever sees them.

use crate::config::ToolSpec;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Flag naming the input file.
pub const INPUT_FLAG: &str = "-f";
/// Flag naming the CSV output directory.
pub const CSV_DIR_FLAG: &str = "--csv";
/// Flag naming the CSV output file.
pub const CSV_FILE_FLAG: &str = "--csvf";
/// Flag naming the `$MFT` used to enrich journal output.
pub const MFT_FLAG: &str = "-m";

/// A fully built tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<OsString>,
}

impl Invocation {
    /// Returns the program to execute.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the argument list.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns the path following `-m`, if the invocation is enriched.
    #[must_use]
    pub fn enrichment_path(&self) -> Option<&Path> {
        self.args
            .iter()
            .position(|a| a == MFT_FLAG)
            .and_then(|i| self.args.get(i + 1))
            .map(Path::new)
    }

    /// Renders the invocation as a single space-joined line for audit.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(OsStr::new(&self.program))
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Creates a `tokio` command for this invocation.
    #[must_use]
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Builds invocations for one configured tool.
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    tool: ToolSpec,
}

impl InvocationBuilder {
    /// Creates a builder for `tool`.
    #[must_use]
    pub fn new(tool: ToolSpec) -> Self {
        Self { tool }
    }

    /// Builds the invocation for one input.
    ///
    /// `input` is the original (unstaged) path. `mft` is appended with
    /// `-m` when the correlation resolver found one.
    #[must_use]
    pub fn build(
        &self,
        input: &Path,
        output_dir: &Path,
        output_file: &Path,
        mft: Option<&Path>,
    ) -> Invocation {
        let mut args: Vec<OsString> = self.tool.entry_args.iter().map(OsString::from).collect();
        args.extend([
            OsString::from(INPUT_FLAG),
            input.as_os_str().to_owned(),
            OsString::from(CSV_DIR_FLAG),
            output_dir.as_os_str().to_owned(),
            OsString::from(CSV_FILE_FLAG),
            output_file.as_os_str().to_owned(),
        ]);
        if let Some(mft) = mft {
            args.push(OsString::from(MFT_FLAG));
            args.push(mft.as_os_str().to_owned());
        }

        Invocation {
            program: self.tool.program.clone(),
            args,
        }
    }
}
