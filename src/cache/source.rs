//! Cache-fronted incident source
//!
//! Serves fresh cache hits without touching the network, refreshes stale or
//! missing entries from the status page, and falls back to the last known
//! good payload when the refresh fails.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{CacheEntry, CacheStore, Ttl, is_fresh};
use crate::client::{FetchRequest, IncidentFetcher};
use crate::error::{FetchError, Result};

/// Runtime knobs for an [`IncidentSource`]
#[derive(Debug, Clone, Copy)]
pub struct SourceOptions {
    /// How long a cached payload is served without refetching
    pub ttl: Ttl,

    /// Whether fresh cache entries may be served (false for `--no-cache`)
    pub cache_enabled: bool,

    /// Upper bound on a single remote fetch
    pub timeout: Duration,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            ttl: Ttl::DEFAULT,
            cache_enabled: true,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Where a payload handed out by [`IncidentSource::fetch`] came from
#[derive(Debug)]
pub enum Origin {
    /// Fetched from the status page during this call
    Remote,

    /// Served from a cache entry that was still fresh
    Cache { stored_at: DateTime<Utc> },

    /// The remote fetch failed; this is the last known good payload
    StaleCache {
        stored_at: DateTime<Utc>,
        error: FetchError,
    },
}

/// Acceptance check for a remote body, run before it is cached
pub type PayloadCheck = fn(&[u8]) -> std::result::Result<(), String>;

/// A payload plus its provenance
#[derive(Debug)]
pub struct Fetched {
    pub payload: Vec<u8>,
    pub origin: Origin,
}

impl Fetched {
    fn from_entry(entry: CacheEntry, origin: impl FnOnce(DateTime<Utc>) -> Origin) -> Self {
        Self {
            origin: origin(entry.stored_at),
            payload: entry.payload,
        }
    }
}

/// Cached wrapper for any [`IncidentFetcher`].
///
/// The store is optional: without one every call goes to the network and
/// failures propagate. The store is wrapped in a Mutex because SQLite
/// connections are not `Sync`.
pub struct IncidentSource<F: IncidentFetcher> {
    fetcher: Arc<F>,
    cache: Option<Mutex<CacheStore>>,
    options: SourceOptions,
    check: Option<PayloadCheck>,
}

impl<F: IncidentFetcher> IncidentSource<F> {
    /// Create a source over `fetcher`, backed by `cache` when available.
    pub fn new(fetcher: F, cache: Option<CacheStore>, options: SourceOptions) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            cache: cache.map(Mutex::new),
            options,
            check: None,
        }
    }

    /// Reject remote bodies that fail `check`. A rejected body is never
    /// cached and counts as a failed fetch.
    pub fn with_check(mut self, check: PayloadCheck) -> Self {
        self.check = Some(check);
        self
    }

    /// Fetch the payload for `request`, at most one remote call per invocation.
    ///
    /// Dropping the returned future before the remote call resolves leaves
    /// the cache untouched.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Fetched> {
        let key = request.cache_key();

        let entry = if self.options.cache_enabled {
            self.read_entry(&key)
        } else {
            None
        };

        let entry = match entry {
            Some(cached) if is_fresh(cached.stored_at, self.options.ttl, Utc::now()) => {
                log::debug!("Cache hit: {} (stored {})", request.url, cached.stored_at);
                return Ok(Fetched::from_entry(cached, |stored_at| Origin::Cache {
                    stored_at,
                }));
            }
            Some(cached) => {
                log::info!("Cache expired (stored {}), refetching", cached.stored_at);
                Some(cached)
            }
            None => {
                log::debug!("Cache miss: {}", request.url);
                None
            }
        };

        match self.fetch_remote(request).await {
            Ok(payload) => {
                self.store(&key, &payload);
                Ok(Fetched {
                    payload,
                    origin: Origin::Remote,
                })
            }
            Err(error) => {
                // Disabling the cache only skips serving fresh hits; a
                // failure still falls back to whatever is stored.
                let fallback = if self.options.cache_enabled {
                    entry
                } else {
                    self.read_entry(&key)
                };

                match fallback {
                    Some(cached) => {
                        log::warn!(
                            "Fetch failed ({}), serving cached data from {}",
                            error,
                            cached.stored_at
                        );
                        Ok(Fetched::from_entry(cached, |stored_at| Origin::StaleCache {
                            stored_at,
                            error,
                        }))
                    }
                    None => {
                        log::error!("Fetch failed and no cached data exists: {}", error);
                        Err(error.into())
                    }
                }
            }
        }
    }

    /// Remote call bounded by the configured timeout, then the payload check
    async fn fetch_remote(&self, request: &FetchRequest) -> std::result::Result<Vec<u8>, FetchError> {
        let timeout = self.options.timeout;
        let payload = match tokio::time::timeout(timeout, self.fetcher.fetch(request)).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout(timeout)),
        };

        if let Some(check) = self.check {
            check(&payload).map_err(FetchError::InvalidPayload)?;
        }
        Ok(payload)
    }

    /// Read an entry, treating any storage failure as a miss. Entries that
    /// fail the payload check are dropped.
    fn read_entry(&self, key: &str) -> Option<CacheEntry> {
        let cache = self.cache.as_ref()?;
        let guard = cache.lock().ok()?;
        let entry = match guard.get(key) {
            Ok(entry) => entry?,
            Err(e) => {
                log::warn!("Cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        if let Some(check) = self.check
            && let Err(reason) = check(&entry.payload)
        {
            log::warn!("Dropping cached payload from {}: {}", entry.stored_at, reason);
            if let Err(e) = guard.delete(key) {
                log::warn!("Failed to drop cache entry: {}", e);
            }
            return None;
        }
        Some(entry)
    }

    /// Store a fresh payload; failures only cost the caching side effect
    fn store(&self, key: &str, payload: &[u8]) {
        if let Some(ref cache) = self.cache
            && let Ok(guard) = cache.lock()
            && let Err(e) = guard.put(key, payload)
        {
            log::warn!("Failed to cache response: {}", e);
        }
    }
}
