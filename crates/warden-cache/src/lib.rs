//! Warden Cache - TTL key/value caching.
//!
//! This crate provides:
//! - [`Cache`], a string-keyed store where every entry carries a max age
//! - [`MemoryCache`], an in-process implementation with lazy expiry on read
//!   and a background sweep
//! - [`Reaper`], the periodic background task used for sweeping, reusable by
//!   other registries (the session manager runs one too)
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use warden_cache::{Cache, CacheItem, MemoryCache};
//!
//! let cache: MemoryCache<String> = MemoryCache::new();
//! cache.set("n:foo", CacheItem::new("account".to_string(), Duration::from_secs(60)));
//! assert_eq!(cache.get("n:foo").as_deref(), Some("account"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cache;
mod memory;
mod reaper;

pub use cache::{Cache, CacheItem, DEFAULT_MAX_AGE, deadline_after};
pub use memory::{DEFAULT_SWEEP_INTERVAL, MemoryCache};
pub use reaper::Reaper;
