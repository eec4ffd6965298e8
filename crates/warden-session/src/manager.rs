//! The session manager contract.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use warden_core::Carrier;

use crate::{Session, SessionResult};

/// Settings for a session about to be started.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Requested lifetime; `None` uses the manager default.
    pub ttl: Option<Duration>,
    /// Transport carrier for backends that need one (for example to set a cookie).
    pub carrier: Option<Carrier>,
}

impl SessionContext {
    /// Request a specific lifetime.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Attach a transport carrier.
    #[must_use]
    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }
}

/// Identifies a session to look up or invalidate.
#[derive(Debug, Clone)]
pub struct SessionKey {
    /// The session id.
    pub id: String,
    /// Transport carrier for backends that locate sessions through it.
    pub carrier: Option<Carrier>,
}

impl SessionKey {
    /// Key a session by id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            carrier: None,
        }
    }

    /// Key for an existing session, keeping its carrier.
    #[must_use]
    pub fn of(session: &dyn Session) -> Self {
        Self {
            id: session.id().to_string(),
            carrier: session.carrier().cloned(),
        }
    }

    /// Attach a transport carrier.
    #[must_use]
    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Creates, finds and destroys sessions.
///
/// Implementations are long-lived and shared; every method takes `&self`.
pub trait SessionManager: Send + Sync + fmt::Debug {
    /// Start a new session.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SessionError`] if the session cannot be created.
    fn start(&self, context: &SessionContext) -> SessionResult<Arc<dyn Session>>;

    /// Find a live session. Does not extend its expiry.
    fn get(&self, key: &SessionKey) -> Option<Arc<dyn Session>>;

    /// Mark a session invalid and forget it.
    fn invalidate(&self, key: &SessionKey);
}
