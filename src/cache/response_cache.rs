//! Persistent LLM response cache with TTL expiry and hit accounting.
//!
//! Persists to a single JSON file (default
//! `~/.promptlab/cache/responses.json`). Rows are keyed by the request
//! fingerprint from [`fingerprint`]. Expiration is lazy: `get` treats an
//! expired row as a miss and leaves it in place until [`evict_expired`] or
//! [`clear`] removes it — there is no background sweep task.
//!
//! [`evict_expired`]: ResponseCache::evict_expired
//! [`clear`]: ResponseCache::clear

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use super::fingerprint::fingerprint;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

/// A single cached response row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    /// The stored payload, returned unchanged on a hit.
    payload: Value,
    /// Unix timestamp when the row was written.
    created_at: u64,
    /// Unix timestamp at which the row becomes a miss. `None` never expires.
    expires_at: Option<u64>,
    /// Hits since this row was last written.
    hit_count: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: u64) -> bool {
        match self.expires_at {
            Some(at) => now >= at,
            None => false,
        }
    }
}

/// Persistent store serialized to JSON.
#[derive(Debug, Serialize, Deserialize, Default)]
struct CacheStore {
    entries: HashMap<String, CacheEntry>,
}

/// Aggregate cache statistics, taken as one consistent snapshot.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of rows currently stored, expired rows included.
    pub total_entries: usize,
    /// Rows past their `expires_at`, computed at query time.
    pub expired_entries: usize,
    /// Cumulative hits across all rows, expired rows included — hit history
    /// belongs to past usage, not present validity.
    pub total_hits: u64,
}

/// Thread-safe persistent response cache keyed by request fingerprint.
///
/// Every operation takes `&self` and serializes through one mutex held for
/// the operation's full duration, so a `ResponseCache` can be shared across
/// threads behind an `Arc` without further locking. All disk writes go
/// through an atomic temp-file-then-rename, so a reader never observes a
/// partially written store.
pub struct ResponseCache {
    path: PathBuf,
    default_ttl_secs: u64,
    store: Mutex<CacheStore>,
}

impl ResponseCache {
    /// Open or create a cache at `config.path`.
    ///
    /// Parent directories are created if absent, and a fresh empty store is
    /// written when no file exists yet, so an unwritable path fails here
    /// rather than on first use. Opening repeatedly against the same path is
    /// safe: an existing store is loaded as-is. A store file that cannot be
    /// read or parsed is surfaced as [`CacheError::StoreUnavailable`].
    pub fn open(config: CacheConfig) -> Result<Self> {
        let CacheConfig {
            path,
            default_ttl_secs,
        } = config;
        // parent() is Some("") for bare relative filenames; nothing to create.
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CacheError::StoreUnavailable(format!(
                    "failed to create cache directory {:?}: {}",
                    parent, e
                ))
            })?;
        }
        let store = if path.exists() {
            Self::load(&path)?
        } else {
            let store = CacheStore::default();
            Self::persist(&path, &store)?;
            store
        };
        debug!(path = %path.display(), entries = store.entries.len(), "opened response cache");
        Ok(Self {
            path,
            default_ttl_secs,
            store: Mutex::new(store),
        })
    }

    /// Open a cache at `path` with the given default TTL in seconds.
    ///
    /// A `default_ttl_secs` of 0 means entries never expire unless `set` is
    /// given an explicit TTL.
    pub fn new(path: impl Into<PathBuf>, default_ttl_secs: u64) -> Result<Self> {
        Self::open(CacheConfig {
            path: path.into(),
            default_ttl_secs,
        })
    }

    /// Look up a cached response for `(prompt, model, params)`.
    ///
    /// Returns `Ok(None)` when the fingerprint is absent or the row has
    /// expired — a miss is an expected outcome, not an error. On a hit the
    /// row's `hit_count` is incremented and flushed before the payload is
    /// returned, so counts survive a restart.
    pub fn get(
        &self,
        prompt: &str,
        model: &str,
        params: &Map<String, Value>,
    ) -> Result<Option<Value>> {
        let key = fingerprint(prompt, model, params)?;
        let now = now_secs();
        let mut store = self.lock();
        let Some(entry) = store.entries.get_mut(&key) else {
            return Ok(None);
        };
        if entry.is_expired(now) {
            debug!(key = %&key[..8], "cache entry expired");
            return Ok(None);
        }
        entry.hit_count = entry.hit_count.saturating_add(1);
        let payload = entry.payload.clone();
        Self::persist(&self.path, &store)?;
        debug!(key = %&key[..8], "cache hit");
        Ok(Some(payload))
    }

    /// Store a response payload for `(prompt, model, params)`.
    ///
    /// Any existing row for the same fingerprint is replaced whole, and its
    /// `hit_count` resets to 0: an overwrite starts a fresh usage history
    /// for the new content. `ttl_secs` overrides the cache's default TTL;
    /// an effective TTL of 0 stores the row without expiration. TTLs are
    /// unsigned, so a negative TTL is unrepresentable at this boundary.
    ///
    /// A payload that cannot be converted to JSON fails with
    /// [`CacheError::Serialization`] before the store is touched.
    pub fn set<T: Serialize>(
        &self,
        prompt: &str,
        model: &str,
        params: &Map<String, Value>,
        payload: &T,
        ttl_secs: Option<u64>,
    ) -> Result<()> {
        let key = fingerprint(prompt, model, params)?;
        let payload = serde_json::to_value(payload).map_err(|e| {
            CacheError::Serialization(format!("failed to serialize payload: {}", e))
        })?;
        let now = now_secs();
        let ttl = ttl_secs.unwrap_or(self.default_ttl_secs);
        let expires_at = (ttl > 0).then(|| now.saturating_add(ttl));
        debug!(key = %&key[..8], ttl_secs = ttl, "storing response");
        let mut store = self.lock();
        store.entries.insert(
            key,
            CacheEntry {
                payload,
                created_at: now,
                expires_at,
                hit_count: 0,
            },
        );
        Self::persist(&self.path, &store)
    }

    /// Remove all rows past their expiry. Returns the number removed.
    ///
    /// Idempotent: with nothing expired it removes zero rows and succeeds
    /// without touching the disk.
    pub fn evict_expired(&self) -> Result<usize> {
        let now = now_secs();
        let mut store = self.lock();
        let before = store.entries.len();
        store.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - store.entries.len();
        if removed > 0 {
            Self::persist(&self.path, &store)?;
            debug!(removed, "evicted expired cache entries");
        }
        Ok(removed)
    }

    /// Remove all rows unconditionally.
    pub fn clear(&self) -> Result<()> {
        let mut store = self.lock();
        store.entries.clear();
        Self::persist(&self.path, &store)
    }

    /// Aggregate statistics over a consistent snapshot of the store.
    pub fn stats(&self) -> CacheStats {
        let now = now_secs();
        let store = self.lock();
        let expired_entries = store
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .count();
        let total_hits: u64 = store.entries.values().map(|entry| entry.hit_count).sum();
        CacheStats {
            total_entries: store.entries.len(),
            expired_entries,
            total_hits,
        }
    }

    /// Number of rows currently stored, expired rows included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// `true` if the store holds no rows.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Rewrite the current snapshot to disk.
    ///
    /// Every mutating operation already flushes; this is an explicit flush
    /// point for callers that want one at the end of a session.
    pub fn flush(&self) -> Result<()> {
        let store = self.lock();
        Self::persist(&self.path, &store)
    }

    /// Path of the backing store file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    // -- private helpers ---------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, CacheStore> {
        // A poisoned lock means another thread panicked mid-operation; the
        // in-memory image is still a complete snapshot, so keep going.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(path: &Path) -> Result<CacheStore> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            CacheError::StoreUnavailable(format!("failed to read cache store {:?}: {}", path, e))
        })?;
        serde_json::from_str(&data).map_err(|e| {
            CacheError::StoreUnavailable(format!("cache store {:?} is corrupt: {}", path, e))
        })
    }

    fn persist(path: &Path, store: &CacheStore) -> Result<()> {
        let data = serde_json::to_string_pretty(store).map_err(|e| {
            CacheError::Serialization(format!("failed to serialize cache store: {}", e))
        })?;
        // Write-to-temp-then-rename: a concurrent reader or a crash
        // mid-write never observes a partially written store.
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".responses-")
            .suffix(".json.tmp")
            .tempfile_in(dir)
            .map_err(|e| {
                CacheError::StoreUnavailable(format!(
                    "failed to create temp file in {:?}: {}",
                    dir, e
                ))
            })?;
        std::fs::write(tmp.path(), data).map_err(|e| {
            CacheError::StoreUnavailable(format!("failed to write cache store: {}", e))
        })?;
        tmp.persist(path).map_err(|e| {
            CacheError::StoreUnavailable(format!(
                "failed to persist cache store {:?}: {}",
                path, e
            ))
        })?;
        Ok(())
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
