//! Supervised execution of the external tool.
//!
//! The runner spawns the child and waits for it while a timer emits
//! heartbeats through the task context. The first heartbeat fires right
//! after spawn. Exit status is reported, not judged; the caller applies
//! the failure policy.

use crate::config::StageConfig;
use crate::context::TaskContext;
use crate::errors::WorkerError;
use crate::invocation::Invocation;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Child;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Result of a child process that ran to termination.
#[derive(Debug, Clone, Copy)]
pub struct ProcessOutcome {
    /// The exit status.
    pub status: ExitStatus,
    /// Number of heartbeats emitted while the child ran.
    pub heartbeats: u64,
    /// Wall-clock run time.
    pub duration: Duration,
}

impl ProcessOutcome {
    /// Returns true if the child exited with code 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Returns the exit code, `None` if the child was killed by a signal.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }
}

/// Runs one invocation at a time with heartbeats, an optional timeout and
/// cooperative cancellation.
#[derive(Debug, Clone)]
pub struct SupervisedRunner {
    heartbeat_interval: Duration,
    timeout: Option<Duration>,
}

impl SupervisedRunner {
    /// Creates a runner with the given heartbeat interval and no timeout.
    #[must_use]
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            heartbeat_interval,
            timeout: None,
        }
    }

    /// Creates a runner from stage configuration.
    #[must_use]
    pub fn from_config(config: &StageConfig) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            timeout: config.process_timeout(),
        }
    }

    /// Sets a timeout after which the child is killed.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the heartbeat interval.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Spawns `invocation` and blocks until it terminates.
    ///
    /// Cancellation is checked on each heartbeat tick. On timeout or
    /// cancellation the child is killed and reaped before returning.
    pub async fn run(
        &self,
        invocation: &Invocation,
        display_name: &str,
        ctx: &TaskContext,
    ) -> Result<ProcessOutcome, WorkerError> {
        let mut child = invocation
            .to_command()
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::spawn(invocation.program(), e))?;

        debug!(
            display_name = %display_name,
            pid = child.id(),
            "Spawned {}", invocation.program()
        );

        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let deadline = deadline(self.timeout);
        tokio::pin!(deadline);
        let mut heartbeats = 0u64;

        loop {
            tokio::select! {
                biased;

                status = child.wait() => {
                    let status = status?;
                    return Ok(ProcessOutcome {
                        status,
                        heartbeats,
                        duration: started.elapsed(),
                    });
                }
                () = &mut deadline => {
                    reap(&mut child, display_name).await;
                    return Err(WorkerError::timeout(
                        invocation.program(),
                        display_name,
                        self.timeout.map_or(0.0, |t| t.as_secs_f64()),
                    ));
                }
                _ = ticker.tick() => {
                    if ctx.is_cancelled() {
                        reap(&mut child, display_name).await;
                        let reason = ctx
                            .cancellation()
                            .reason()
                            .unwrap_or_else(|| "cancelled".to_string());
                        return Err(WorkerError::Cancelled(reason));
                    }
                    ctx.heartbeat();
                    heartbeats += 1;
                }
            }
        }
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending().await,
    }
}

async fn reap(child: &mut Child, display_name: &str) {
    if let Err(e) = child.kill().await {
        warn!(display_name = %display_name, error = %e, "Failed to kill tool process");
    }
}
