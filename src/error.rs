//! Crate-wide error and result types.

use thiserror::Error;

/// Errors surfaced by cache operations.
///
/// A miss is never an error: lookups return `Ok(None)`, so callers can
/// distinguish "not cached" from a genuine storage fault and decide whether
/// to proceed without the cache or abort.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backing store file cannot be created, opened, read, written, or
    /// parsed. Surfaced immediately; never retried or swallowed.
    #[error("cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// A payload could not be converted to or from the persisted JSON
    /// encoding. Raised on `set` before any store mutation is visible.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// Malformed input (e.g. an empty model identifier), rejected before
    /// the store is touched.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
