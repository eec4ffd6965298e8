//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_cache::prelude::*;` to import all essential types.

pub use crate::{Cache, CacheItem, MemoryCache, Reaper};
