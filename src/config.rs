//! Cache construction settings.
//!
//! The cache reads no environment variables or configuration files itself;
//! callers build a [`CacheConfig`] and hand it to
//! [`ResponseCache::open`](crate::ResponseCache::open).

use std::path::PathBuf;

/// TTL applied to entries stored without an explicit one, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Settings for opening a [`ResponseCache`](crate::ResponseCache).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Location of the backing store file. Parent directories are created
    /// on open if absent.
    pub path: PathBuf,
    /// Default TTL in seconds for entries stored without an explicit TTL.
    ///
    /// 0 means "no expiration": entries stored under a zero TTL never
    /// expire.
    pub default_ttl_secs: u64,
}

impl CacheConfig {
    /// Config with a store at `path` and the default TTL.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        let path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".promptlab")
            .join("cache")
            .join("responses.json");
        Self {
            path,
            default_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}
