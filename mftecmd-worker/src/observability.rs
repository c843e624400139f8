//! Logging setup and per-file timing.

use crate::errors::WorkerError;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
/// Logs go to stderr so stdout stays free for the task result.
pub fn init_tracing(json: bool) -> Result<(), WorkerError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| WorkerError::Config(format!("failed to install tracing subscriber: {e}")))
}

/// Measures how long the tool spent on one input.
#[derive(Debug)]
pub struct TaskSpanTimer {
    start: Instant,
    display_name: String,
}

impl TaskSpanTimer {
    /// Starts timing `display_name`.
    #[must_use]
    pub fn start(display_name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            display_name: display_name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the input being timed.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Stops the timer and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!(display_name = %self.display_name, duration_ms = elapsed, "Finished input");
        elapsed
    }
}
