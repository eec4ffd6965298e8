//! In-memory sessions.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::{Duration, Instant};

use rand::RngCore;
use rand::rngs::OsRng;
use warden_cache::{Reaper, deadline_after};
use warden_core::Carrier;

use crate::{Session, SessionContext, SessionError, SessionKey, SessionManager, SessionResult};

/// Lifetime of sessions started without an explicit TTL.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1_800);

/// How often the reaper of [`MemorySessionManager::new`] runs.
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(5);

/// Random bytes in a session id (hex-encoded to twice as many characters).
pub const SESSION_ID_BYTES: usize = 24;

/// A session held in process memory.
pub struct MemorySession {
    id: String,
    expires_at: Instant,
    valid: AtomicBool,
    dirty: AtomicBool,
    attributes: RwLock<HashMap<String, Vec<u8>>>,
    carrier: Option<Carrier>,
}

impl MemorySession {
    fn new(id: String, ttl: Duration, carrier: Option<Carrier>) -> Self {
        Self {
            id,
            expires_at: deadline_after(Instant::now(), ttl),
            valid: AtomicBool::new(true),
            dirty: AtomicBool::new(false),
            attributes: RwLock::new(HashMap::new()),
            carrier,
        }
    }

    /// Mark the session invalid and drop its attributes.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
        self.attributes
            .write()
            .unwrap_or_else(|e| {
                tracing::warn!("MemorySession lock poisoned, recovering");
                e.into_inner()
            })
            .clear();
    }

    /// Whether attributes changed since the last save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }
}

impl Session for MemorySession {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn expires_at(&self) -> Instant {
        self.expires_at
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.attributes
            .read()
            .unwrap_or_else(|e| {
                tracing::warn!("MemorySession read lock poisoned, recovering");
                e.into_inner()
            })
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        if !self.is_valid() {
            tracing::debug!(session_id = %self.id, key, "Ignoring write to invalid session");
            return;
        }
        self.attributes
            .write()
            .unwrap_or_else(|e| {
                tracing::warn!("MemorySession lock poisoned, recovering");
                e.into_inner()
            })
            .insert(key.to_string(), value);
        self.dirty.store(true, Ordering::SeqCst);
    }

    fn remove(&self, key: &str) {
        let removed = self
            .attributes
            .write()
            .unwrap_or_else(|e| {
                tracing::warn!("MemorySession lock poisoned, recovering");
                e.into_inner()
            })
            .remove(key);
        if removed.is_some() {
            self.dirty.store(true, Ordering::SeqCst);
        }
    }

    fn save(&self) -> SessionResult<()> {
        if !self.is_valid() {
            return Err(SessionError::Invalid {
                id: self.id.clone(),
            });
        }
        // Memory is the store; saving only settles the dirty flag.
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn carrier(&self) -> Option<&Carrier> {
        self.carrier.as_ref()
    }
}

impl fmt::Debug for MemorySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySession")
            .field("id", &self.id)
            .field("valid", &self.is_valid())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

type Registry = Mutex<HashMap<String, Arc<MemorySession>>>;

fn lock(registry: &Registry) -> MutexGuard<'_, HashMap<String, Arc<MemorySession>>> {
    registry.lock().unwrap_or_else(|e| {
        tracing::warn!("MemorySessionManager lock poisoned, recovering");
        e.into_inner()
    })
}

fn reap(registry: &Registry) -> usize {
    let now = Instant::now();
    let mut sessions = lock(registry);
    let before = sessions.len();
    sessions.retain(|_, s| {
        let live = now < s.expires_at;
        if !live {
            s.valid.store(false, Ordering::SeqCst);
        }
        live
    });
    before.saturating_sub(sessions.len())
}

fn random_id() -> SessionResult<String> {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| SessionError::Entropy(e.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Keeps sessions in process memory.
///
/// A background reaper deletes expired sessions on a fixed interval whether
/// or not they are ever looked up again. The reaper stops on
/// [`MemorySessionManager::shutdown`] or when the manager is dropped.
pub struct MemorySessionManager {
    sessions: Arc<Registry>,
    default_ttl: Duration,
    reaper: Mutex<Option<Reaper>>,
}

impl MemorySessionManager {
    /// Create a manager with a 30 minute default TTL, reaping every 5 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_SESSION_TTL, Some(DEFAULT_REAP_INTERVAL))
    }

    /// Create a manager with a custom default TTL and reap interval.
    ///
    /// `None` (or a zero interval) disables the background reaper. A zero TTL
    /// falls back to [`DEFAULT_SESSION_TTL`].
    #[must_use]
    pub fn with_settings(default_ttl: Duration, reap_interval: Option<Duration>) -> Self {
        let sessions: Arc<Registry> = Arc::new(Mutex::new(HashMap::new()));
        let default_ttl = if default_ttl.is_zero() {
            DEFAULT_SESSION_TTL
        } else {
            default_ttl
        };

        let reaper = reap_interval
            .filter(|interval| !interval.is_zero())
            .and_then(|interval| spawn_reaper(&sessions, interval));

        Self {
            sessions,
            default_ttl,
            reaper: Mutex::new(reaper),
        }
    }

    /// Default lifetime of new sessions.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Number of registered sessions, including expired ones not yet reaped.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Whether no sessions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete expired sessions now. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        reap(&self.sessions)
    }

    /// Whether the background reaper is running.
    #[must_use]
    pub fn is_reaping(&self) -> bool {
        self.reaper_slot().as_ref().is_some_and(Reaper::is_running)
    }

    /// Stop the background reaper and wait for it to exit.
    ///
    /// Registered sessions are kept; expired ones are then only dropped on
    /// lookup or by [`MemorySessionManager::cleanup_expired`].
    pub fn shutdown(&self) {
        let reaper = self.reaper_slot().take();
        if let Some(mut reaper) = reaper {
            reaper.shutdown();
        }
    }

    fn reaper_slot(&self) -> MutexGuard<'_, Option<Reaper>> {
        self.reaper.lock().unwrap_or_else(|e| {
            tracing::warn!("MemorySessionManager reaper lock poisoned, recovering");
            e.into_inner()
        })
    }
}

fn spawn_reaper(sessions: &Arc<Registry>, interval: Duration) -> Option<Reaper> {
    let weak: Weak<Registry> = Arc::downgrade(sessions);
    let task = move || match weak.upgrade() {
        Some(sessions) => {
            let reaped = reap(&sessions);
            if reaped > 0 {
                tracing::debug!(reaped, "Reaped expired sessions");
            }
            true
        },
        None => false,
    };

    match Reaper::spawn("warden-session-reaper", interval, task) {
        Ok(reaper) => Some(reaper),
        Err(e) => {
            tracing::warn!("Failed to start session reaper, expired sessions are dropped on lookup only: {e}");
            None
        },
    }
}

impl SessionManager for MemorySessionManager {
    fn start(&self, context: &SessionContext) -> SessionResult<Arc<dyn Session>> {
        let ttl = context
            .ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);
        let session = Arc::new(MemorySession::new(random_id()?, ttl, context.carrier.clone()));

        lock(&self.sessions).insert(session.id.clone(), Arc::clone(&session));
        tracing::debug!(session_id = %session.id, ?ttl, "Started session");

        Ok(session)
    }

    fn get(&self, key: &SessionKey) -> Option<Arc<dyn Session>> {
        let mut sessions = lock(&self.sessions);
        let session = sessions.get(&key.id)?;

        if session.is_expired() {
            session.valid.store(false, Ordering::SeqCst);
            sessions.remove(&key.id);
            tracing::debug!(session_id = %key.id, "Session expired");
            return None;
        }
        Some(Arc::clone(session) as Arc<dyn Session>)
    }

    fn invalidate(&self, key: &SessionKey) {
        if let Some(session) = lock(&self.sessions).remove(&key.id) {
            session.invalidate();
            tracing::debug!(session_id = %key.id, "Invalidated session");
        }
    }
}

impl Default for MemorySessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemorySessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySessionManager")
            .field("sessions", &self.len())
            .field("default_ttl", &self.default_ttl)
            .field("reaping", &self.is_reaping())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    fn manager() -> MemorySessionManager {
        MemorySessionManager::with_settings(DEFAULT_SESSION_TTL, None)
    }

    #[test]
    fn test_get_does_not_extend_expiry() {
        let manager = manager();
        let session = manager.start(&SessionContext::default()).unwrap();
        let expires_at = session.expires_at();

        thread::sleep(Duration::from_millis(10));
        let fetched = manager.get(&SessionKey::of(session.as_ref())).unwrap();
        assert_eq!(fetched.expires_at(), expires_at);
        assert_eq!(session.expires_at(), expires_at);
    }

    #[test]
    fn test_session_ids_are_random_hex() {
        let manager = manager();
        let ids: HashSet<String> = (0..64)
            .map(|_| {
                manager
                    .start(&SessionContext::default())
                    .unwrap()
                    .id()
                    .to_string()
            })
            .collect();
        assert_eq!(ids.len(), 64);
        for id in &ids {
            assert_eq!(id.len(), SESSION_ID_BYTES * 2);
            assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        }
    }

    #[test]
    fn test_start_get_invalidate() {
        let manager = manager();
        let session = manager.start(&SessionContext::default()).unwrap();
        let key = SessionKey::of(session.as_ref());

        assert!(session.is_valid());
        assert!(manager.get(&key).is_some());

        manager.invalidate(&key);
        assert!(!session.is_valid());
        assert!(manager.get(&key).is_none());
        assert!(manager.is_empty());
        assert!(matches!(session.save(), Err(SessionError::Invalid { .. })));
    }

    #[test]
    fn test_attributes_and_dirty_flag() {
        let session = MemorySession::new("s".to_string(), DEFAULT_SESSION_TTL, None);
        assert!(!session.is_dirty());

        session.set("k", b"v".to_vec());
        assert!(session.is_dirty());
        assert_eq!(session.get("k"), Some(b"v".to_vec()));

        session.save().unwrap();
        assert!(!session.is_dirty());

        session.remove("missing");
        assert!(!session.is_dirty());
        session.remove("k");
        assert!(session.is_dirty());
        assert!(session.get("k").is_none());
    }

    #[test]
    fn test_invalid_session_ignores_writes() {
        let session = MemorySession::new("s".to_string(), DEFAULT_SESSION_TTL, None);
        session.set("k", b"v".to_vec());
        session.invalidate();
        assert!(session.get("k").is_none());
        session.set("k", b"v".to_vec());
        assert!(session.get("k").is_none());
    }

    #[test]
    fn test_context_ttl_overrides_default() {
        let manager = manager();
        let short = manager
            .start(&SessionContext::default().with_ttl(Duration::from_millis(30)))
            .unwrap();
        let long = manager.start(&SessionContext::default()).unwrap();
        assert!(short.expires_at() < long.expires_at());

        thread::sleep(Duration::from_millis(60));
        assert!(short.is_expired());
        assert!(manager.get(&SessionKey::of(short.as_ref())).is_none());
        assert!(manager.get(&SessionKey::of(long.as_ref())).is_some());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_reaper_removes_expired_sessions() {
        let manager = MemorySessionManager::with_settings(
            Duration::from_millis(20),
            Some(Duration::from_millis(20)),
        );
        manager.start(&SessionContext::default()).unwrap();
        manager.start(&SessionContext::default()).unwrap();
        assert_eq!(manager.len(), 2);

        thread::sleep(Duration::from_millis(200));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_shutdown_stops_reaper() {
        let manager = MemorySessionManager::with_settings(
            Duration::from_millis(10),
            Some(Duration::from_millis(10)),
        );
        assert!(manager.is_reaping());
        manager.shutdown();
        assert!(!manager.is_reaping());

        manager.start(&SessionContext::default()).unwrap();
        thread::sleep(Duration::from_millis(60));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.cleanup_expired(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let manager = MemorySessionManager::with_settings(Duration::from_millis(10), None);
        manager.start(&SessionContext::default()).unwrap();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(manager.cleanup_expired(), 1);
    }

    #[test]
    fn test_carrier_passes_through() {
        let manager = manager();
        let carrier = Carrier::new("request-1");
        let session = manager
            .start(&SessionContext::default().with_carrier(carrier.clone()))
            .unwrap();
        assert!(session.carrier().unwrap().ptr_eq(&carrier));
        assert!(SessionKey::of(session.as_ref()).carrier.is_some());
    }
}
