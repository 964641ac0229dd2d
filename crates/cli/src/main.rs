//! Media Index command line tool
//!
//! ## Commands
//!
//! - `ingest` - Copy media files into an image or video ingest
//! - `indexers` - List the registered indexer types
//! - `status` - Show whether an indexer has a model and where it lives
//! - `generate` - Build and persist a model from a feature file
//! - `rank` - Rank the indexed elements from positive/negative exemplars
//!
//! Feature files are JSON objects mapping element ids to vectors:
//! `{ "0": [0.1, 0.2], "1": [0.3, 0.4] }`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use media_indexer::{FeatureId, Parallelism};
use serde::Serialize;
use std::path::PathBuf;

mod command;
mod config;
mod ingest;

use command::{IngestType, RankRequest};
use config::SystemConfig;

#[derive(Parser)]
#[command(name = "media-index")]
#[command(about = "Ingest media and drive indexer model lifecycles")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $MEDIA_INDEX_CONFIG or the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Add debug messages to the log output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the configured data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the configured work directory
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or grow an ingest from files and glob patterns
    Ingest {
        /// Ingest data type
        #[arg(short = 't', long = "type", value_enum)]
        kind: IngestType,

        /// Custom directory to base the ingest in
        #[arg(short = 'd', long = "dir")]
        dir: Option<PathBuf>,

        /// Files or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// List registered indexer types
    Indexers,

    /// Show the model state of an indexer
    Status {
        #[arg(short, long)]
        indexer: String,
    },

    /// Generate and persist a model
    Generate {
        #[arg(short, long)]
        indexer: String,

        /// JSON feature file
        #[arg(short, long)]
        features: PathBuf,

        /// Worker threads (all processors when omitted)
        #[arg(short, long)]
        parallel: Option<usize>,
    },

    /// Rank indexed elements
    Rank {
        #[arg(short, long)]
        indexer: String,

        /// Positive exemplar ids
        #[arg(short, long, value_delimiter = ',', required = true)]
        positive: Vec<FeatureId>,

        /// Negative exemplar ids
        #[arg(short, long, value_delimiter = ',')]
        negative: Vec<FeatureId>,

        /// Feature files folded in before ranking (not persisted)
        #[arg(short, long)]
        extend: Vec<PathBuf>,

        /// Print at most this many results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Worker threads used for extensions
        #[arg(long)]
        parallel: Option<usize>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cmd: Commands, config: &SystemConfig) -> Result<()> {
    match cmd {
        Commands::Ingest { kind, dir, inputs } => {
            let report = command::ingest(config, kind, dir.as_deref(), &inputs)?;
            log::info!(
                "Ingest {} now holds {} files ({} added, {} duplicates)",
                report.data_dir.display(),
                report.total,
                report.added.len(),
                report.duplicates.len()
            );
            print_json(&report)
        }
        Commands::Indexers => {
            let registry = config.registry()?;
            for info in command::list_indexers(&registry) {
                println!("{}\t{}", info.name, info.description);
            }
            Ok(())
        }
        Commands::Status { indexer } => {
            let registry = config.registry()?;
            print_json(&command::status(config, &registry, &indexer)?)
        }
        Commands::Generate {
            indexer,
            features,
            parallel,
        } => {
            let registry = config.registry()?;
            let report = command::generate(
                config,
                &registry,
                &indexer,
                &features,
                Parallelism::from(parallel),
            )?;
            print_json(&report)
        }
        Commands::Rank {
            indexer,
            positive,
            negative,
            extend,
            limit,
            parallel,
        } => {
            let registry = config.registry()?;
            let request = RankRequest {
                positive: &positive,
                negative: &negative,
                extend: &extend,
                limit,
                parallelism: Parallelism::from(parallel),
            };
            print_json(&command::rank(config, &registry, &indexer, &request)?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = SystemConfig::locate(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(dir) = cli.work_dir {
        config.work_dir = dir;
    }
    log::debug!("Using configuration: {config:?}");

    let cmd = cli.command;
    tokio::task::spawn_blocking(move || run(cmd, &config))
        .await
        .context("Command task panicked")?
}
