//! Instrumented realms for testing.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use warden_authc::{AuthenticationInfo, AuthenticationToken, CredentialsMatcher, TokenKind};
use warden_authz::AuthorizationInfo;
use warden_cache::deadline_after;
use warden_core::Principal;
use warden_realm::{AuthorizingRealm, IniRealm, Realm, RealmError, RealmResult};
use warden_session::{
    DEFAULT_SESSION_TTL, Session, SessionContext, SessionError, SessionKey, SessionManager,
    SessionResult,
};

/// Wraps a realm and counts the lookups that reach it.
///
/// Only the data lookups are forwarded; the wrapped realm's direct
/// [`Authorizer`](warden_authz::Authorizer) capability is hidden so that
/// every role or permission check goes through
/// [`AuthorizingRealm::authorization_info`].
pub struct CountingRealm {
    inner: Arc<dyn AuthorizingRealm>,
    supports_calls: AtomicUsize,
    authentication_calls: AtomicUsize,
    authorization_calls: AtomicUsize,
}

impl CountingRealm {
    /// Count lookups into `inner`.
    #[must_use]
    pub fn new(inner: Arc<dyn AuthorizingRealm>) -> Self {
        Self {
            inner,
            supports_calls: AtomicUsize::new(0),
            authentication_calls: AtomicUsize::new(0),
            authorization_calls: AtomicUsize::new(0),
        }
    }

    /// Count lookups into an INI realm built from `text`.
    ///
    /// # Panics
    ///
    /// Panics if the text is not a valid realm definition.
    #[must_use]
    pub fn from_ini(name: &str, text: &str) -> Self {
        let realm = IniRealm::parse(name, text).expect("fixture realm parses");
        Self::new(Arc::new(realm))
    }

    /// Number of `supports` calls.
    #[must_use]
    pub fn supports_calls(&self) -> usize {
        self.supports_calls.load(Ordering::SeqCst)
    }

    /// Number of authentication lookups.
    #[must_use]
    pub fn authentication_calls(&self) -> usize {
        self.authentication_calls.load(Ordering::SeqCst)
    }

    /// Number of authorization lookups.
    #[must_use]
    pub fn authorization_calls(&self) -> usize {
        self.authorization_calls.load(Ordering::SeqCst)
    }

    /// Zero every counter.
    pub fn reset_counts(&self) {
        self.supports_calls.store(0, Ordering::SeqCst);
        self.authentication_calls.store(0, Ordering::SeqCst);
        self.authorization_calls.store(0, Ordering::SeqCst);
    }
}

impl Realm for CountingRealm {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, token: &dyn AuthenticationToken) -> bool {
        self.supports_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.supports(token)
    }

    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>> {
        self.authentication_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authentication_info(token)
    }

    fn credentials_matcher(&self) -> Option<&dyn CredentialsMatcher> {
        self.inner.credentials_matcher()
    }

    fn as_authorizing(&self) -> Option<&dyn AuthorizingRealm> {
        Some(self)
    }
}

impl AuthorizingRealm for CountingRealm {
    fn authorization_info(
        &self,
        principals: &[Principal],
    ) -> RealmResult<Arc<dyn AuthorizationInfo>> {
        self.authorization_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authorization_info(principals)
    }
}

impl fmt::Debug for CountingRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingRealm")
            .field("inner", &self.inner.name())
            .field("authentication_calls", &self.authentication_calls())
            .field("authorization_calls", &self.authorization_calls())
            .finish()
    }
}

/// A realm that accepts only tokens of one foreign kind, so it never
/// supports username/password logins.
#[derive(Debug)]
pub struct UnsupportedRealm {
    name: String,
    kind: TokenKind,
    lookups: AtomicUsize,
}

impl UnsupportedRealm {
    /// Create a realm supporting only `TokenKind::Other("unsupported")`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TokenKind::Other("unsupported"),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Number of lookups attempted despite `supports` returning false.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl Realm for UnsupportedRealm {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, token: &dyn AuthenticationToken) -> bool {
        token.kind() == self.kind
    }

    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Err(RealmError::UnknownAccount {
            principal: token.principal().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
struct StoredSession {
    expires_at: Instant,
    attributes: HashMap<String, Vec<u8>>,
}

type SessionStore = Arc<Mutex<HashMap<String, StoredSession>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A session manager that keeps only what sessions `save`.
///
/// `get` rebuilds a session from its last saved attributes, the way a cookie
/// or external store would, so unsaved changes are lost between interactions.
#[derive(Debug, Default)]
pub struct DurableSessionManager {
    store: SessionStore,
    next_id: AtomicUsize,
}

impl DurableSessionManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The saved value of attribute `key` in session `id`.
    #[must_use]
    pub fn stored(&self, id: &str, key: &str) -> Option<Vec<u8>> {
        lock(&self.store)
            .get(id)
            .and_then(|s| s.attributes.get(key).cloned())
    }
}

impl SessionManager for DurableSessionManager {
    fn start(&self, context: &SessionContext) -> SessionResult<Arc<dyn Session>> {
        let id = format!("durable-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let ttl = context.ttl.unwrap_or(DEFAULT_SESSION_TTL);
        let stored = StoredSession {
            expires_at: deadline_after(Instant::now(), ttl),
            attributes: HashMap::new(),
        };
        lock(&self.store).insert(id.clone(), stored.clone());
        Ok(Arc::new(DurableSession::new(id, stored, Arc::clone(&self.store))))
    }

    fn get(&self, key: &SessionKey) -> Option<Arc<dyn Session>> {
        let stored = lock(&self.store).get(&key.id).cloned()?;
        if Instant::now() >= stored.expires_at {
            return None;
        }
        Some(Arc::new(DurableSession::new(
            key.id.clone(),
            stored,
            Arc::clone(&self.store),
        )))
    }

    fn invalidate(&self, key: &SessionKey) {
        lock(&self.store).remove(&key.id);
    }
}

/// A session whose attributes reach the store only on `save`.
#[derive(Debug)]
pub struct DurableSession {
    id: String,
    expires_at: Instant,
    valid: AtomicBool,
    attributes: Mutex<HashMap<String, Vec<u8>>>,
    store: SessionStore,
}

impl DurableSession {
    fn new(id: String, stored: StoredSession, store: SessionStore) -> Self {
        Self {
            id,
            expires_at: stored.expires_at,
            valid: AtomicBool::new(true),
            attributes: Mutex::new(stored.attributes),
            store,
        }
    }
}

impl Session for DurableSession {
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
        lock(&self.attributes).get(key).cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        lock(&self.attributes).insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        lock(&self.attributes).remove(key);
    }

    fn save(&self) -> SessionResult<()> {
        let mut store = lock(&self.store);
        let Some(stored) = store.get_mut(&self.id) else {
            self.valid.store(false, Ordering::SeqCst);
            return Err(SessionError::NotFound {
                id: self.id.clone(),
            });
        };
        stored.attributes.clone_from(&lock(&self.attributes));
        Ok(())
    }
}
