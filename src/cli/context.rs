//! Command execution context
//!
//! Loads configuration once, applies the global flag overrides, and builds
//! the cache store and incident source the commands share.

use std::path::PathBuf;

use crate::cache::{CacheStore, IncidentSource, SourceOptions};
use crate::cli::{GlobalOptions, OutputFormat};
use crate::client::{IncidentFeed, StatusPageClient};
use crate::config::Config;
use crate::error::Result;

/// Context for command execution containing config and runtime options.
pub struct CommandContext {
    /// Loaded configuration with CLI overrides applied
    pub config: Config,
    /// Output format preference
    pub format: OutputFormat,
}

impl CommandContext {
    /// Create a new command context.
    ///
    /// # Errors
    /// Returns error if the config file cannot be loaded or holds invalid values.
    pub fn new(opts: &GlobalOptions) -> Result<Self> {
        let mut config = Config::load_at(opts.config_ref())?;
        opts.apply_to(&mut config);
        config.validate()?;

        Ok(Self {
            config,
            format: opts.format,
        })
    }

    /// Resolved cache root
    pub fn cache_dir(&self) -> Result<PathBuf> {
        self.config.cache_dir()
    }

    /// Open the cache store, creating its root directory if needed
    pub fn open_cache(&self) -> Result<CacheStore> {
        let root = self.cache_dir()?;
        std::fs::create_dir_all(&root)?;
        Ok(CacheStore::open_at(&root)?)
    }

    /// Build the cache-fronted status page source.
    ///
    /// A cache that cannot be opened is logged and skipped; the report still
    /// runs against the network. Bodies that are not an incident feed are
    /// never cached.
    pub fn incident_source(&self) -> Result<IncidentSource<StatusPageClient>> {
        let client = StatusPageClient::new(self.config.fetch_timeout())?;

        let cache = match self.open_cache() {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("Cache unavailable, continuing without it: {}", e);
                None
            }
        };

        let options = SourceOptions {
            ttl: self.config.cache.ttl,
            cache_enabled: self.config.cache.enabled,
            timeout: self.config.fetch_timeout(),
        };

        Ok(IncidentSource::new(client, cache, options).with_check(IncidentFeed::validate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Ttl;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "fetch_timeout_secs: 10\ncache:\n  ttl: 60\n");

        let opts = GlobalOptions {
            config: Some(path),
            cache_ttl: Some(Ttl::Infinite),
            ..Default::default()
        };
        let ctx = CommandContext::new(&opts).unwrap();

        assert_eq!(ctx.config.cache.ttl, Ttl::Infinite);
        assert_eq!(ctx.config.fetch_timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let dir = TempDir::new().unwrap();
        let opts = GlobalOptions {
            config: Some(write_config(&dir, "")),
            timeout: Some(0),
            ..Default::default()
        };

        assert!(CommandContext::new(&opts).is_err());
    }

    #[test]
    fn test_open_cache_creates_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("nested").join("cache");
        let opts = GlobalOptions {
            config: Some(write_config(&dir, "")),
            cache_dir: Some(root.clone()),
            ..Default::default()
        };

        let ctx = CommandContext::new(&opts).unwrap();
        let store = ctx.open_cache().unwrap();

        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }
}
