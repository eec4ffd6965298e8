//! In-process cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::{Duration, Instant};

use crate::{Cache, CacheItem, DEFAULT_MAX_AGE, Reaper, deadline_after};

/// Interval of the background sweep for caches built with [`MemoryCache::new`].
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type Entries<V> = RwLock<HashMap<String, Entry<V>>>;

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A cache held in process memory.
///
/// Reads take a shared lock; writes and sweeps take the exclusive lock. An
/// expired entry is removed when a `get` finds it, and the background
/// [`Reaper`] removes the rest on a fixed interval. The reaper stops on
/// [`MemoryCache::shutdown`] or when the cache is dropped.
pub struct MemoryCache<V> {
    entries: Arc<Entries<V>>,
    default_max_age: Duration,
    reaper: Mutex<Option<Reaper>>,
}

impl<V> MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache with a 60 minute default max age and a sweep every minute.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_MAX_AGE, Some(DEFAULT_SWEEP_INTERVAL))
    }

    /// Create a cache with a custom default max age and sweep interval.
    ///
    /// `None` (or a zero interval) disables the background sweep; expired
    /// entries are then only dropped when read or by
    /// [`MemoryCache::cleanup_expired`]. A zero default max age falls back to
    /// [`DEFAULT_MAX_AGE`].
    #[must_use]
    pub fn with_settings(default_max_age: Duration, sweep_interval: Option<Duration>) -> Self {
        let entries: Arc<Entries<V>> = Arc::new(RwLock::new(HashMap::new()));
        let default_max_age = if default_max_age.is_zero() {
            DEFAULT_MAX_AGE
        } else {
            default_max_age
        };

        let reaper = sweep_interval
            .filter(|interval| !interval.is_zero())
            .and_then(|interval| Self::spawn_reaper(&entries, interval));

        Self {
            entries,
            default_max_age,
            reaper: Mutex::new(reaper),
        }
    }

    fn spawn_reaper(entries: &Arc<Entries<V>>, interval: Duration) -> Option<Reaper> {
        let weak: Weak<Entries<V>> = Arc::downgrade(entries);
        let task = move || match weak.upgrade() {
            Some(entries) => {
                let removed = sweep(&entries);
                if removed > 0 {
                    tracing::trace!(removed, "Swept expired cache entries");
                }
                true
            },
            None => false,
        };

        match Reaper::spawn("warden-cache-sweep", interval, task) {
            Ok(reaper) => Some(reaper),
            Err(e) => {
                tracing::warn!("Failed to start cache sweeper, relying on lazy expiry: {e}");
                None
            },
        }
    }

    /// Default max age applied to items stored with a zero max age.
    #[must_use]
    pub fn default_max_age(&self) -> Duration {
        self.default_max_age
    }

    /// Whether a background sweep is running.
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.reaper_slot().as_ref().is_some_and(Reaper::is_running)
    }

    /// Stop the background sweep and wait for it to exit.
    ///
    /// The cache stays usable; expired entries are then only dropped when
    /// read or by [`MemoryCache::cleanup_expired`].
    pub fn shutdown(&self) {
        let reaper = self.reaper_slot().take();
        if let Some(mut reaper) = reaper {
            reaper.shutdown();
        }
    }

    fn reaper_slot(&self) -> std::sync::MutexGuard<'_, Option<Reaper>> {
        self.reaper.lock().unwrap_or_else(|e| {
            tracing::warn!("MemoryCache reaper lock poisoned, recovering");
            e.into_inner()
        })
    }

    /// Remove all expired entries now.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        sweep(&self.entries)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<V>>> {
        self.entries.read().unwrap_or_else(|e| {
            tracing::warn!("MemoryCache read lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
        write_entries(&self.entries)
    }
}

fn write_entries<V>(entries: &Entries<V>) -> RwLockWriteGuard<'_, HashMap<String, Entry<V>>> {
    entries.write().unwrap_or_else(|e| {
        tracing::warn!("MemoryCache lock poisoned, recovering");
        e.into_inner()
    })
}

fn sweep<V>(entries: &Entries<V>) -> usize {
    let now = Instant::now();
    let mut map = write_entries(entries);
    let before = map.len();
    map.retain(|_, entry| !entry.is_expired(now));
    before.saturating_sub(map.len())
}

impl<V> Cache<V> for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.read();
            let entry = entries.get(key)?;
            if !entry.is_expired(Instant::now()) {
                tracing::trace!(key, "Cache hit");
                return Some(entry.value.clone());
            }
        }

        // Expired: upgrade to the write lock and re-check, a writer may have
        // refreshed the entry in between.
        let mut entries = self.write();
        let now = Instant::now();
        match entries.get(key).map(|e| e.is_expired(now)) {
            Some(false) => entries.get(key).map(|e| e.value.clone()),
            Some(true) => {
                entries.remove(key);
                tracing::trace!(key, "Cache entry expired");
                None
            },
            None => None,
        }
    }

    fn set(&self, key: &str, item: CacheItem<V>) {
        let max_age = if item.max_age.is_zero() {
            self.default_max_age
        } else {
            item.max_age
        };
        let entry = Entry {
            value: item.value,
            expires_at: deadline_after(Instant::now(), max_age),
        };
        self.write().insert(key.to_string(), entry);
    }

    fn has(&self, key: &str) -> bool {
        let now = Instant::now();
        self.read().get(key).is_some_and(|e| !e.is_expired(now))
    }

    fn del(&self, key: &str) {
        self.write().remove(key);
    }

    fn purge(&self) {
        self.write().clear();
    }

    fn len(&self) -> usize {
        self.read().len()
    }
}

impl<V> Default for MemoryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for MemoryCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("default_max_age", &self.default_max_age)
            .field(
                "sweeping",
                &self.reaper.lock().is_ok_and(|r| r.is_some()),
            )
            .finish_non_exhaustive()
    }
}
