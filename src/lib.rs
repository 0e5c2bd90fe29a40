//! promptlab — prompt experimentation toolkit for hosted LLM APIs.
//!
//! The crate's core is [`ResponseCache`]: a persistent, thread-safe,
//! TTL-aware store of model responses keyed by a deterministic
//! [`fingerprint`] of `(prompt, model, parameters)`. Callers consult the
//! cache before a model call and write the response back on a miss:
//!
//! ```no_run
//! use promptlab::{CacheConfig, ResponseCache};
//! use serde_json::{json, Map};
//!
//! # fn main() -> promptlab::Result<()> {
//! let cache = ResponseCache::open(CacheConfig::default())?;
//! let mut params = Map::new();
//! params.insert("temperature".to_string(), json!(0.7));
//!
//! if let Some(hit) = cache.get("Summarize Rust ownership", "gpt-4o", &params)? {
//!     println!("{hit}");
//! } else {
//!     // ... call the model API here, then store its response record:
//!     let response = json!({"text": "Ownership moves values.", "tokens": 42});
//!     cache.set("Summarize Rust ownership", "gpt-4o", &params, &response, None)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! A miss is a first-class outcome (`Ok(None)`), distinct from storage
//! faults, which surface as [`CacheError`].

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{fingerprint, CacheStats, ResponseCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
