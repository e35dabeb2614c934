//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cache::Ttl;

pub mod args;
pub mod cache;
pub mod context;
pub mod report;

pub use args::{GlobalOptions, OutputFormat};
pub use context::CommandContext;

/// incidentmap - monthly severity matrix for status page incident feeds
#[derive(Parser, Debug)]
#[command(name = "incidentmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (table, json)
    #[arg(
        long,
        global = true,
        env = "INCIDENTMAP_FORMAT",
        default_value = "table",
        hide_env = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "INCIDENTMAP_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Override cache directory
    #[arg(long, global = true, env = "INCIDENTMAP_CACHE_DIR", hide_env = true)]
    pub cache_dir: Option<PathBuf>,

    /// Cache time-to-live in seconds, or "infinite"
    #[arg(long, global = true, env = "INCIDENTMAP_CACHE_TTL", hide_env = true)]
    pub cache_ttl: Option<Ttl>,

    /// Bypass cache, fetch fresh data from the status page
    #[arg(long, global = true, env = "INCIDENTMAP_NO_CACHE", hide_env = true)]
    pub no_cache: bool,

    /// Remote fetch timeout in seconds
    #[arg(long, global = true, env = "INCIDENTMAP_TIMEOUT", hide_env = true)]
    pub timeout: Option<u64>,

    /// Enable debug logging
    #[arg(long, global = true, env = "INCIDENTMAP_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Enable informational logging
    #[arg(short, long, global = true, env = "INCIDENTMAP_VERBOSE", hide_env = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch incidents and print the monthly severity matrix
    Report(ReportArgs),

    /// Manage local response cache
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Display version information
    Version,
}

/// Options for the report command
#[derive(Debug, Clone, Args, Default)]
pub struct ReportArgs {
    /// Incident feed endpoint (Statuspage v2 incidents.json)
    #[arg(long, env = "INCIDENTMAP_API_URL", hide_env = true)]
    pub api_url: Option<String>,

    /// Write the report to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

/// Cache management subcommands
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Show cache statistics
    Status,

    /// Clear all cached responses
    Clear,

    /// Print cache directory path
    Path,
}
