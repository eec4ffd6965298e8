//! The cache contract.

use std::time::{Duration, Instant};

/// Max age applied to entries stored with a zero max age.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(3_600);

/// Upper bound used when `now + ttl` does not fit in an [`Instant`].
const FAR_FUTURE: Duration = Duration::from_secs(3_153_600_000);

/// The instant `ttl` after `now`, saturating at a far-future deadline.
#[must_use]
pub fn deadline_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// A value to store, with its max age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheItem<V> {
    /// The cached value.
    pub value: V,
    /// How long the value stays valid. Zero means the cache's default.
    pub max_age: Duration,
}

impl<V> CacheItem<V> {
    /// Create an item with an explicit max age.
    #[must_use]
    pub fn new(value: V, max_age: Duration) -> Self {
        Self { value, max_age }
    }

    /// Create an item that uses the cache's default max age.
    #[must_use]
    pub fn with_default_age(value: V) -> Self {
        Self::new(value, Duration::ZERO)
    }
}

/// A string-keyed store of expiring values.
///
/// Expired entries are never returned. Implementations must be safe to share
/// between threads.
pub trait Cache<V>: Send + Sync {
    /// The value stored under `key`, if present and not expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Store `item` under `key`, replacing any previous value.
    fn set(&self, key: &str, item: CacheItem<V>);

    /// Whether a live value is stored under `key`.
    fn has(&self, key: &str) -> bool;

    /// Remove the value stored under `key`.
    fn del(&self, key: &str);

    /// Remove every entry.
    fn purge(&self);

    /// Number of stored entries, including expired ones not yet swept.
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
