use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ingest payloads, turn them into deduplicated records and publish what
/// changed.
#[derive(Debug, Parser)]
#[command(name = "mergebot", version)]
pub struct Cli {
    /// Configuration file (YAML, TOML or JSON). Defaults to the user-level
    /// `config.yaml`.
    #[arg(short, long, global = true, env = "MERGEBOT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store payloads and queue them for transformation.
    Ingest {
        /// Configured source the files came from.
        #[arg(short, long)]
        source: String,
        /// Identifier of the payload within its source. Defaults to the
        /// content hash.
        #[arg(long)]
        external_id: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Parse every pending payload into records.
    Transform,
    /// Build every route's artifacts and publish those that changed.
    Publish {
        /// Only this route.
        #[arg(short, long)]
        route: Option<String>,
    },
    /// Transform, then publish.
    Run {
        /// Only publish this route.
        #[arg(short, long)]
        route: Option<String>,
    },
    /// Queue a failed payload for another transform attempt.
    Requeue {
        /// Content hash of the payload.
        hash: String,
    },
    /// Count payloads by processing status.
    Status,
}
