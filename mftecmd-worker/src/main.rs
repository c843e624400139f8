//! Command-line entry point for the MFTECmd worker.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mftecmd_worker::cancellation::CancellationToken;
use mftecmd_worker::config::StageConfig;
use mftecmd_worker::context::{TaskContext, TaskIdentity};
use mftecmd_worker::events::LoggingEventSink;
use mftecmd_worker::observability::init_tracing;
use mftecmd_worker::registry::default_registry;
use mftecmd_worker::task::{TaskRequest, TASK_NAME};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Runs Eric Zimmerman's MFTECmd over NTFS metadata files.
#[derive(Parser, Debug)]
#[command(name = "mftecmd-worker", version, about)]
struct Args {
    /// Path to a YAML stage configuration
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a task request read from a JSON file
    Run {
        /// Path to the JSON task request
        #[arg(short, long)]
        request: PathBuf,

        /// Task name to dispatch
        #[arg(short, long, default_value = TASK_NAME)]
        task: String,

        /// Worker name reported in logs
        #[arg(long)]
        worker_name: Option<String>,

        /// Print the result base64-encoded instead of as JSON
        #[arg(long)]
        encode: bool,
    },
    /// Print the metadata of every registered task as JSON
    Metadata,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs)?;

    let config = StageConfig::load(args.config.as_deref()).context("Failed to load stage configuration")?;
    let registry = default_registry(config);

    match args.command {
        Commands::Metadata => {
            let metadata: serde_json::Map<String, serde_json::Value> = registry
                .metadata()
                .into_iter()
                .map(|(name, meta)| serde_json::to_value(meta).map(|value| (name, value)))
                .collect::<Result<_, serde_json::Error>>()?;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Commands::Run {
            request,
            task,
            worker_name,
            encode,
        } => {
            let text = std::fs::read_to_string(&request)
                .with_context(|| format!("Failed to read request {}", request.display()))?;
            let request: TaskRequest = serde_json::from_str(&text).context("Invalid task request")?;

            let mut identity = TaskIdentity::new(&task);
            if let Some(worker_name) = worker_name {
                identity = identity.with_worker_name(worker_name);
            }
            let token = Arc::new(CancellationToken::new());
            let ctx = TaskContext::new(identity)
                .with_event_sink(Arc::new(LoggingEventSink::default()))
                .with_cancellation(token.clone());

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    token.cancel("interrupted");
                }
            });

            let result = match registry.dispatch(&task, &ctx, request).await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = ?e.to_dict(), "Task failed");
                    return Err(e).context(format!("Task {task} failed"));
                }
            };
            info!(output_count = result.output_files.len(), "Task finished");

            if encode {
                println!("{}", result.encode()?);
            } else {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }

    Ok(())
}
