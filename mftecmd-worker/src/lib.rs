//! # MFTECmd worker
//!
//! A pipeline stage that runs Eric Zimmerman's MFTECmd over NTFS metadata
//! files (`$MFT`, `$J`, `$Boot`, `$LogFile`, ...) and reports one CSV
//! output per input back to the orchestrator.
//!
//! The stage:
//!
//! - **Selects inputs**: hostname marker files are set aside, everything
//!   else goes to the tool
//! - **Names outputs** after the host recorded in a marker, if any
//! - **Stages inputs** as hard links in a private per-invocation directory
//! - **Correlates** change-journal files with the batch's `$MFT`
//! - **Supervises** each tool run, emitting heartbeats while it works
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mftecmd_worker::prelude::*;
//!
//! let registry = default_registry(StageConfig::load(None)?);
//! let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME))
//!     .with_event_sink(Arc::new(LoggingEventSink::default()));
//!
//! let request = TaskRequest::new("/data/output", inputs);
//! let result = registry.dispatch(TASK_NAME, &ctx, request).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod collector;
pub mod config;
pub mod context;
pub mod core;
pub mod correlation;
pub mod errors;
pub mod events;
pub mod invocation;
pub mod markers;
pub mod observability;
pub mod process;
pub mod registry;
pub mod selection;
pub mod staging;
pub mod task;

mod integration_tests;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::collector::{OutputAllocator, OutputCollector, UuidOutputAllocator};
    pub use crate::config::{StageConfig, ToolFailurePolicy, ToolSpec};
    pub use crate::context::{TaskContext, TaskIdentity};
    pub use crate::core::{InputFile, OutputFile, TaskEvent, TaskResult};
    pub use crate::errors::WorkerError;
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::registry::{default_registry, TaskHandler, TaskMetadata, TaskRegistry};
    pub use crate::task::{MftecmdTask, TaskRequest, TASK_NAME};
}
