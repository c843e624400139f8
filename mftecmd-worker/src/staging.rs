//! Isolated working directory for one task invocation.
//!
//! Inputs are hard-linked, not copied, into `<output_path>/<uuid>` so the
//! tool sees a private directory without duplicating large artifacts. The
//! directory is removed when the [`StagingArea`] is cleaned up or dropped,
//! whichever comes first.

use crate::core::InputFile;
use crate::errors::WorkerError;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A uniquely named directory holding hard links to the task's inputs.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    members: Vec<PathBuf>,
    removed: bool,
}

impl StagingArea {
    /// Creates a fresh staging directory under `output_path`.
    ///
    /// The name is a random UUID. An existing directory of that name is a
    /// hard error; there is no retry.
    pub fn create(output_path: &Path) -> Result<Self, WorkerError> {
        let root = output_path.join(Uuid::new_v4().simple().to_string());
        std::fs::create_dir(&root).map_err(|e| WorkerError::staging(&root, e))?;
        debug!(staging_dir = %root.display(), "Created staging directory");

        Ok(Self {
            root,
            members: Vec::new(),
            removed: false,
        })
    }

    /// Returns the staging directory path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the staged paths in link order.
    #[must_use]
    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    /// Hard-links `input` into the directory under its base filename.
    pub fn link(&mut self, input: &InputFile) -> Result<PathBuf, WorkerError> {
        let target = self.root.join(input.file_name());
        std::fs::hard_link(input.path(), &target).map_err(|e| WorkerError::staging(&target, e))?;
        self.members.push(target.clone());
        Ok(target)
    }

    /// Removes the directory and everything in it.
    ///
    /// A directory that no longer exists counts as removed.
    pub fn cleanup(mut self) -> io::Result<()> {
        self.removed = true;
        remove_dir(&self.root)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = remove_dir(&self.root) {
            warn!(staging_dir = %self.root.display(), error = %e, "Failed to remove staging directory");
        }
    }
}

fn remove_dir(root: &Path) -> io::Result<()> {
    match std::fs::remove_dir_all(root) {
        Ok(()) => {
            debug!(staging_dir = %root.display(), "Removed staging directory");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
