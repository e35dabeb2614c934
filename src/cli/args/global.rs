//! Global CLI options shared across all commands
//!
//! Collects the global flags once so handlers take a single struct instead of
//! a long parameter list.

use std::path::{Path, PathBuf};

use crate::cache::Ttl;
use crate::cli::{Cli, OutputFormat};
use crate::config::Config;

/// Global CLI options passed to all command handlers.
///
/// # Precedence
///
/// For every option the precedence is: CLI flag > environment variable > config file > default.
/// This struct captures the CLI/env layer; [`GlobalOptions::apply_to`] lays it over the
/// loaded config file.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format (table, json)
    pub format: OutputFormat,

    /// Custom config file path (defaults to ~/.incidentmap/config.yaml)
    pub config: Option<PathBuf>,

    /// Cache directory override
    pub cache_dir: Option<PathBuf>,

    /// Cache TTL override
    pub cache_ttl: Option<Ttl>,

    /// Skip fresh cache reads
    pub no_cache: bool,

    /// Fetch timeout override, in seconds
    pub timeout: Option<u64>,
}

impl GlobalOptions {
    /// Create GlobalOptions from a parsed CLI struct.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            config: cli.config.clone(),
            cache_dir: cli.cache_dir.clone(),
            cache_ttl: cli.cache_ttl,
            no_cache: cli.no_cache,
            timeout: cli.timeout,
        }
    }

    /// Get config path as `Option<&Path>`.
    pub fn config_ref(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    /// Override config file values with any flags that were given
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        if let Some(ttl) = self.cache_ttl {
            config.cache.ttl = ttl;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }
    }
}
