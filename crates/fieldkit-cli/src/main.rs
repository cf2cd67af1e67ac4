mod commands;
mod config;
mod logging;
mod sink;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fieldkit_core::{Position, SamplingPlan};
use fieldkit_session::{FieldSession, RemoteSync};
use fieldkit_storage::{FileKv, KvStore, MemoryKv, SqliteKv};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::commands::{ChecklistArgs, ExportArgs, RecordArgs};
use crate::config::{Backend, FieldkitConfig};

#[derive(Parser)]
#[command(name = "fieldkit")]
#[command(about = "Soil sampling field companion", long_about = None)]
struct Cli {
    /// Config file (defaults to FIELDKIT_CONFIG, then ./fieldkit.toml)
    #[arg(long, global = true, env = "FIELDKIT_CONFIG")]
    config: Option<PathBuf>,
    /// Verbose logging on stderr
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List sampling points with their progress
    Points,
    /// Select a point and show its status
    Show {
        point: u32,
        /// Current position as lat,lon[,accuracy]
        #[arg(long, value_parser = commands::parse_position)]
        at: Option<Position>,
    },
    /// Record (or replace) the observation for a point
    Record(RecordArgs),
    /// Mark the physical sample for a point as collected
    SampleDone { point: u32 },
    /// List recorded observations
    List,
    /// Export all observations as CSV
    Export(ExportArgs),
    /// Delete every recorded observation
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Show the equipment checklist
    Checklist(ChecklistArgs),
    /// Follow position fixes from stdin and report distance to a point
    Track { point: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.debug);

    let config = FieldkitConfig::load(cli.config.as_deref())?;
    let plan = config.load_plan()?;
    let sync = config
        .sync_config()
        .map(|sync| RemoteSync::new(&sync))
        .transpose()
        .context("Failed to set up remote sync")?;
    if sync.is_none() {
        debug!(event = "sync_disabled", reason = "not_configured");
    }

    let path = config.storage_path();
    match config.storage.backend {
        Backend::Files => {
            let kv = FileKv::open(&path)
                .with_context(|| format!("Failed to open data dir {}", path.display()))?;
            run(cli.command, &config, plan, kv, sync).await
        }
        Backend::Sqlite => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let kv = SqliteKv::open(&path)
                .with_context(|| format!("Failed to open database {}", path.display()))?;
            run(cli.command, &config, plan, Arc::new(kv), sync).await
        }
        Backend::Memory => {
            info!(event = "memory_backend", "nothing will be persisted");
            run(cli.command, &config, plan, MemoryKv::new(), sync).await
        }
    }
}

async fn run<K: KvStore + Clone>(
    command: Commands,
    config: &FieldkitConfig,
    plan: SamplingPlan,
    kv: K,
    sync: Option<RemoteSync>,
) -> Result<()> {
    let mut session = FieldSession::open(plan, kv, sync)?;

    let result = match command {
        Commands::Points => {
            commands::list_points(&session);
            Ok(())
        }
        Commands::Show { point, at } => commands::show_point(&mut session, point, at),
        Commands::Record(args) => commands::record(&mut session, args),
        Commands::SampleDone { point } => commands::sample_done(&mut session, point),
        Commands::List => {
            commands::list_observations(&session);
            Ok(())
        }
        Commands::Export(args) => commands::export(&session, config, args),
        Commands::Clear { yes } => commands::clear(&mut session, yes),
        Commands::Checklist(args) => commands::checklist(&mut session, args),
        Commands::Track { point } => commands::track(&mut session, point).await,
    };

    // In-flight sync posts would be cut off when the runtime shuts down.
    session.drain_sync().await;
    result
}
