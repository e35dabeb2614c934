//! SQLite-based cache storage with file blob support
//!
//! Stores small payloads inline in SQLite and large payloads (>10KB) as
//! content-addressed blob files. Blob files are written to a temp file and
//! renamed into place, and index rows are replaced inside a transaction, so a
//! reader sees either the previous complete entry or the new one.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::key::content_digest;
use super::{Ttl, is_fresh};
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 1;

/// Payloads larger than this are stored as external blobs
const INLINE_THRESHOLD: usize = 10 * 1024; // 10KB

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

type Result<T> = std::result::Result<T, CacheError>;

/// A cached payload together with the time it was stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

/// SQLite-backed cache storage with file blob support
pub struct CacheStore {
    conn: Connection,
    root: PathBuf,
    blobs_dir: PathBuf,
}

impl CacheStore {
    /// Default cache directory (~/.cache/incidentmap on Linux)
    pub fn default_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("incidentmap"))
    }

    /// Open cache storage under an existing root directory.
    ///
    /// The root itself is never created here; only the database and blob
    /// directory inside it are.
    pub fn open_at(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(CacheError::MissingRoot(root.to_path_buf()));
        }

        let db_path = root.join("cache.db");
        let blobs_dir = root.join("blobs");
        std::fs::create_dir_all(&blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create blobs dir: {}", e)))?;

        let conn = Connection::open(&db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        // Check schema version - nuke if mismatched
        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            Self::nuke(&db_path, &blobs_dir)?;
            return Self::open_at(root);
        }

        // WAL lets readers in other processes proceed while a write commits
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |r| r.get(0))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS cache_entries (
                cache_key TEXT PRIMARY KEY NOT NULL,
                data BLOB,
                blob_path TEXT,
                stored_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_stored_at ON cache_entries(stored_at);
            CREATE INDEX IF NOT EXISTS idx_blob_path ON cache_entries(blob_path);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn,
            root: root.to_path_buf(),
            blobs_dir,
        })
    }

    /// Root directory this store reads and writes
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the entry stored under `key`, whatever its age.
    ///
    /// Returns `Ok(None)` when no complete entry exists.
    pub fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        // A concurrent writer may swap the blob between reading the row and
        // reading the file, so a vanished blob earns one re-read of the row.
        for attempt in 0..2 {
            let row: Option<(Option<Vec<u8>>, Option<String>, i64)> = self
                .conn
                .query_row(
                    "SELECT data, blob_path, stored_at FROM cache_entries WHERE cache_key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
                )
                .optional()?;

            let Some((data, blob_path, stored_ms)) = row else {
                return Ok(None);
            };

            let Some(stored_at) = DateTime::from_timestamp_millis(stored_ms) else {
                log::warn!("Cache entry has invalid timestamp {}, ignoring", stored_ms);
                return Ok(None);
            };

            let payload = match (data, blob_path) {
                (Some(data), None) => data,
                (None, Some(blob_path)) => match self.read_blob(&blob_path) {
                    Ok(Some(data)) => data,
                    Ok(None) if attempt == 0 => {
                        log::debug!("Blob {} vanished, re-reading index", blob_path);
                        continue;
                    }
                    Ok(None) => return Ok(None),
                    Err(e) => {
                        log::warn!("Failed to read blob {}: {}", blob_path, e);
                        return Ok(None);
                    }
                },
                _ => {
                    log::warn!("Cache entry {} has no payload, ignoring", key);
                    return Ok(None);
                }
            };

            return Ok(Some(CacheEntry {
                key: key.to_string(),
                payload,
                stored_at,
            }));
        }

        Ok(None)
    }

    /// Store `payload` under `key`, stamped with the current time.
    pub fn put(&self, key: &str, payload: &[u8]) -> Result<()> {
        self.put_at(key, payload, Utc::now())
    }

    /// Store `payload` under `key` with an explicit storage time.
    pub fn put_at(&self, key: &str, payload: &[u8], stored_at: DateTime<Utc>) -> Result<()> {
        let stored_ms = stored_at.timestamp_millis();

        // Blob files are only created or removed while holding the database
        // write lock, so one writer never removes a blob another is about to
        // reference.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;

        let blob_path = if payload.len() <= INLINE_THRESHOLD {
            None
        } else {
            Some(self.write_blob(payload)?)
        };

        let previous_blob: Option<String> = tx
            .query_row(
                "SELECT blob_path FROM cache_entries WHERE cache_key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        match blob_path.as_deref() {
            None => tx.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_key, data, blob_path, stored_at, size_bytes)
                 VALUES (?1, ?2, NULL, ?3, ?4)",
                params![key, payload, stored_ms, payload.len() as i64],
            )?,
            Some(path) => tx.execute(
                "INSERT OR REPLACE INTO cache_entries
                 (cache_key, data, blob_path, stored_at, size_bytes)
                 VALUES (?1, NULL, ?2, ?3, ?4)",
                params![key, path, stored_ms, payload.len() as i64],
            )?,
        };

        if let Some(previous) = previous_blob
            && blob_path.as_deref() != Some(previous.as_str())
        {
            Self::remove_orphan(&tx, &self.blobs_dir, &previous)?;
        }

        tx.commit()?;
        log::debug!("Cached {} bytes under {}", payload.len(), key);
        Ok(())
    }

    /// Delete a specific cache entry by key
    pub fn delete(&self, key: &str) -> Result<bool> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let previous_blob: Option<String> = tx
            .query_row(
                "SELECT blob_path FROM cache_entries WHERE cache_key = ?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?
            .flatten();

        let deleted = tx.execute("DELETE FROM cache_entries WHERE cache_key = ?1", [key])?;
        if let Some(previous) = previous_blob {
            Self::remove_orphan(&tx, &self.blobs_dir, &previous)?;
        }
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Clear all cache entries
    pub fn clear_all(&self) -> Result<ClearStats> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |r| r.get(0))?;

        self.conn.execute("DELETE FROM cache_entries", [])?;

        // Clear blobs directory
        if self.blobs_dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.blobs_dir) {
                log::warn!("Failed to clear blobs directory: {}", e);
            }
            std::fs::create_dir_all(&self.blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        }

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Get cache statistics, judging freshness against `ttl` at `now`
    pub fn stats(&self, ttl: Ttl, now: DateTime<Utc>) -> Result<CacheStats> {
        let mut stmt = self
            .conn
            .prepare("SELECT stored_at, size_bytes FROM cache_entries")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, i64>(1)?)))?;

        let mut stats = CacheStats::default();
        for row in rows {
            let (stored_ms, size) = row?;
            stats.total_entries += 1;
            stats.total_size_bytes += size.max(0) as usize;

            let Some(stored_at) = DateTime::from_timestamp_millis(stored_ms) else {
                stats.stale_entries += 1;
                continue;
            };
            if is_fresh(stored_at, ttl, now) {
                stats.fresh_entries += 1;
            } else {
                stats.stale_entries += 1;
            }
            stats.oldest_entry = Some(stats.oldest_entry.map_or(stored_at, |o| o.min(stored_at)));
            stats.newest_entry = Some(stats.newest_entry.map_or(stored_at, |n| n.max(stored_at)));
        }

        Ok(stats)
    }

    /// Read a blob, verifying it still matches the digest in its name.
    ///
    /// Returns `Ok(None)` if the file is missing or its content does not match.
    fn read_blob(&self, rel_path: &str) -> std::io::Result<Option<Vec<u8>>> {
        let full_path = self.blobs_dir.join(rel_path);
        let data = match std::fs::read(&full_path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let expected = Path::new(rel_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if content_digest(&data) != expected {
            log::warn!("Blob {} failed digest check, ignoring", rel_path);
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Write a content-addressed blob file, sharded by first 2 chars of its digest
    fn write_blob(&self, data: &[u8]) -> Result<String> {
        let digest = content_digest(data);
        let shard = &digest[..2];
        let shard_dir = self.blobs_dir.join(shard);
        std::fs::create_dir_all(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create shard dir: {}", e)))?;

        let filename = format!("{}.bin", digest);
        let rel_path = format!("{}/{}", shard, filename);
        let full_path = shard_dir.join(&filename);

        let mut tmp = tempfile::NamedTempFile::new_in(&shard_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create temp blob: {}", e)))?;
        tmp.write_all(data)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| CacheError::Io(format!("Failed to write blob: {}", e)))?;
        tmp.persist(&full_path)
            .map_err(|e| CacheError::Io(format!("Failed to move blob into place: {}", e.error)))?;

        Ok(rel_path)
    }

    /// Remove a blob file once no index row references it
    fn remove_orphan(tx: &Transaction<'_>, blobs_dir: &Path, rel_path: &str) -> Result<()> {
        let references: i64 = tx.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE blob_path = ?1",
            params![rel_path],
            |r| r.get(0),
        )?;
        if references == 0
            && let Err(e) = std::fs::remove_file(blobs_dir.join(rel_path))
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log::warn!("Failed to remove orphaned blob {}: {}", rel_path, e);
        }
        Ok(())
    }

    /// Nuke the cache (delete DB and all blobs)
    fn nuke(db_path: &Path, blobs_dir: &Path) -> Result<()> {
        if db_path.exists() {
            std::fs::remove_file(db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
        }
        if blobs_dir.exists() {
            std::fs::remove_dir_all(blobs_dir)
                .map_err(|e| CacheError::Io(format!("Failed to remove blobs dir: {}", e)))?;
        }
        std::fs::create_dir_all(blobs_dir)
            .map_err(|e| CacheError::Io(format!("Failed to recreate blobs dir: {}", e)))?;
        Ok(())
    }
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}
