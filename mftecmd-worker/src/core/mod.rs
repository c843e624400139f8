//! Core domain model types for the worker.
//!
//! This module contains the descriptors exchanged with the orchestrator:
//! - Input and output file descriptors
//! - The task result record
//! - Events emitted while the task runs

mod event;
mod input;
mod output;
mod result;

pub use event::{TaskEvent, FILE_COMPLETED_EVENT, FILE_STARTED_EVENT, HEARTBEAT_EVENT};
pub use input::InputFile;
pub use output::{OutputFile, CONFIG_PASSTHROUGH_DATA_TYPE, MFTECMD_DATA_TYPE};
pub use result::TaskResult;
