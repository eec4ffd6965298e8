//! Settings for creating a subject.

use std::time::Duration;

use warden_core::{Carrier, Principal};

/// Controls how [`SecurityManager::create_subject`](crate::SecurityManager::create_subject)
/// builds a subject.
#[derive(Debug, Clone, Default)]
pub struct SubjectContext {
    /// Give the subject a session. Without this the subject never gains one,
    /// even when asked.
    pub create_sessions: bool,
    /// Whether the subject starts out authenticated.
    pub authenticated: bool,
    /// Principals the subject starts out with.
    pub principals: Vec<Principal>,
    /// Resume this existing session instead of starting a new one.
    pub session_id: Option<String>,
    /// Lifetime of sessions started for the subject; `None` uses the manager default.
    pub session_ttl: Option<Duration>,
    /// Transport carrier handed to the session manager.
    pub carrier: Option<Carrier>,
}

impl SubjectContext {
    /// A context for an anonymous, sessionless subject.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable sessions.
    #[must_use]
    pub fn with_sessions(mut self, create_sessions: bool) -> Self {
        self.create_sessions = create_sessions;
        self
    }

    /// Start out as the given identity.
    ///
    /// Use this when assuming an identity programmatically; the subject is
    /// authenticated only if `authenticated` is set.
    #[must_use]
    pub fn with_principals(mut self, principals: Vec<Principal>, authenticated: bool) -> Self {
        self.principals = principals;
        self.authenticated = authenticated;
        self
    }

    /// Resume an existing session. Implies sessions are enabled.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self.create_sessions = true;
        self
    }

    /// Set the lifetime of sessions started for the subject.
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Attach a transport carrier.
    #[must_use]
    pub fn with_carrier(mut self, carrier: Carrier) -> Self {
        self.carrier = Some(carrier);
        self
    }
}
