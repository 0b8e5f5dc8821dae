//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tagsweep - integrity sweeps for S3-compatible buckets
#[derive(Parser)]
#[command(name = "tagsweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify bucket contents against their stored entity tags")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Endpoint selection shared by all commands that talk to a bucket
#[derive(Parser)]
pub struct StorageArgs {
    /// Bucket to verify
    #[arg(long, env = "TAGSWEEP_BUCKET")]
    pub bucket: Option<String>,

    /// S3 endpoint override for non-AWS object stores
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Region to use
    #[arg(long)]
    pub region: Option<String>,

    /// Use path-style addressing (most self-hosted backends need this)
    #[arg(long)]
    pub path_style: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Sweep every object in the bucket and report inconsistencies
    Sweep {
        #[command(flatten)]
        storage: StorageArgs,

        /// Only check keys under this prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Concurrent object checks
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Verify a single object
    Check {
        /// Object key to verify
        key: String,

        #[command(flatten)]
        storage: StorageArgs,
    },
}
