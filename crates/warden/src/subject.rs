//! The per-interaction identity facade.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use warden_authc::AuthenticationToken;
use warden_authz::{Authorizer, Permission};
use warden_core::{Carrier, Principal};
use warden_session::{Session, SessionContext};

use crate::{
    LoginError, PrincipalStack, SecurityError, SecurityManager, SecurityResult, SubjectContext,
};

/// Session attribute holding the subject's principals.
pub const PRINCIPALS_KEY: &str = "warden.principals";

/// Session attribute holding the authenticated flag.
pub const AUTHENTICATED_KEY: &str = "warden.authenticated";

/// Session attribute holding the run-as stack.
pub const RUN_AS_KEY: &str = "warden.run_as";

#[derive(Default)]
struct SubjectState {
    principals: Vec<Principal>,
    authenticated: bool,
    run_as: PrincipalStack,
    session: Option<Arc<dyn Session>>,
}

/// The identity of one external interaction.
///
/// A subject exists even before login, as an anonymous identity. Role and
/// permission checks delegate to the owning [`SecurityManager`]. While a
/// run-as identity is assumed, every check uses it instead of the real one.
///
/// Subjects are cheap and internally synchronized; hosts usually create one
/// per request and drop (or release) it when the request ends.
pub struct Subject {
    manager: Arc<SecurityManager>,
    create_sessions: bool,
    session_ttl: Option<Duration>,
    carrier: Option<Carrier>,
    state: Mutex<SubjectState>,
}

impl Subject {
    pub(crate) fn new(manager: Arc<SecurityManager>, context: &SubjectContext) -> Self {
        Self {
            manager,
            create_sessions: context.create_sessions,
            session_ttl: context.session_ttl,
            carrier: context.carrier.clone(),
            state: Mutex::new(SubjectState {
                principals: context.principals.clone(),
                authenticated: context.authenticated && !context.principals.is_empty(),
                ..SubjectState::default()
            }),
        }
    }

    /// The manager this subject belongs to.
    #[must_use]
    pub fn manager(&self) -> &Arc<SecurityManager> {
        &self.manager
    }

    /// The transport carrier the subject was created with.
    #[must_use]
    pub fn carrier(&self) -> Option<&Carrier> {
        self.carrier.as_ref()
    }

    /// The primary effective principal.
    #[must_use]
    pub fn principal(&self) -> Option<Principal> {
        self.principals().into_iter().next()
    }

    /// The effective principals: the assumed run-as identity if any,
    /// otherwise the real one. Empty for an anonymous subject.
    #[must_use]
    pub fn principals(&self) -> Vec<Principal> {
        let state = self.state();
        if state.principals.is_empty() {
            return Vec::new();
        }
        state
            .run_as
            .peek()
            .map_or_else(|_| state.principals.clone(), <[Principal]>::to_vec)
    }

    /// The subject's session, started on first use when sessions are enabled.
    ///
    /// Returns `None` when sessions are disabled or cannot be started.
    #[must_use]
    pub fn session(&self) -> Option<Arc<dyn Session>> {
        let mut state = self.state();
        self.session_locked(&mut state)
    }

    /// Whether the effective principals hold `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        let principals = self.principals();
        !principals.is_empty() && self.manager.has_role(&principals, role)
    }

    /// Whether the effective principals are granted `permission`.
    #[must_use]
    pub fn is_permitted(&self, permission: &Permission) -> bool {
        let principals = self.principals();
        !principals.is_empty() && self.manager.is_permitted(&principals, permission)
    }

    /// Parse `permission` and check it. Malformed strings are never permitted.
    #[must_use]
    pub fn is_permitted_str(&self, permission: &str) -> bool {
        let principals = self.principals();
        !principals.is_empty() && self.manager.is_permitted_str(&principals, permission)
    }

    /// Whether the subject logged in during this or a resumed interaction.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    /// Whether the subject has an identity without having authenticated,
    /// for example one restored from a remembered session.
    #[must_use]
    pub fn is_remembered(&self) -> bool {
        let state = self.state();
        !state.principals.is_empty() && !state.authenticated
    }

    /// Whether a run-as identity is assumed.
    #[must_use]
    pub fn is_run_as(&self) -> bool {
        !self.state().run_as.is_empty()
    }

    /// Log in with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`LoginError::Misconfigured`] when the manager cannot
    /// authenticate anyone, and [`LoginError::AuthenticationFailed`] for
    /// every rejected login. The detailed cause is logged at debug level.
    pub fn login(&self, token: &dyn AuthenticationToken) -> Result<(), LoginError> {
        self.manager.login(self, token).map_err(|e| {
            tracing::debug!(principal = %token.principal(), error = %e, "Login failed");
            LoginError::from(&e)
        })
    }

    /// Log out, dropping the identity and invalidating the session.
    pub fn logout(&self) {
        if let Err(e) = self.manager.logout(self) {
            tracing::warn!(error = %e, "Logout failed");
        }
    }

    /// Assume `principals` on top of the current identity.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::NoPrincipals`] if the subject has no identity
    /// yet and [`SecurityError::EmptyPrincipalSet`] if `principals` is empty.
    pub fn run_as(&self, principals: Vec<Principal>) -> SecurityResult<()> {
        let mut state = self.state();
        if state.principals.is_empty() {
            return Err(SecurityError::NoPrincipals);
        }
        state.run_as.push(principals)?;
        self.store_run_as(&mut state);
        Ok(())
    }

    /// Drop the most recently assumed identity and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::NoPrincipals`] if the subject has no identity
    /// and [`SecurityError::EmptyStack`] if no identity is assumed.
    pub fn release_run_as(&self) -> SecurityResult<Vec<Principal>> {
        let mut state = self.state();
        if state.principals.is_empty() {
            return Err(SecurityError::NoPrincipals);
        }
        let released = state.run_as.pop()?;
        self.store_run_as(&mut state);
        Ok(released)
    }

    /// The currently assumed identity, without releasing it.
    #[must_use]
    pub fn previous_principals(&self) -> Option<Vec<Principal>> {
        self.state().run_as.peek().ok().map(<[Principal]>::to_vec)
    }

    /// Restore principals, authenticated flag and run-as stack from the
    /// session. Attributes that fail to decode are skipped.
    pub fn load(&self) {
        let mut state = self.state();
        let Some(session) = state.session.clone() else {
            return;
        };

        if let Some(bytes) = session.get(PRINCIPALS_KEY) {
            match serde_json::from_slice::<Vec<Principal>>(&bytes) {
                Ok(principals) => state.principals = principals,
                Err(e) => tracing::warn!(session_id = %session.id(), "Ignoring stored principals: {e}"),
            }
        }
        if let Some(bytes) = session.get(AUTHENTICATED_KEY) {
            match serde_json::from_slice::<bool>(&bytes) {
                Ok(authenticated) => state.authenticated = authenticated,
                Err(e) => tracing::warn!(session_id = %session.id(), "Ignoring stored authenticated flag: {e}"),
            }
        }
        if let Some(bytes) = session.get(RUN_AS_KEY) {
            match PrincipalStack::decode(&bytes) {
                Ok(stack) => state.run_as = stack,
                Err(e) => tracing::warn!(session_id = %session.id(), "Ignoring stored run-as stack: {e}"),
            }
        }
        if state.authenticated && state.principals.is_empty() {
            tracing::warn!(session_id = %session.id(), "Stored session is authenticated without principals, ignoring the flag");
            state.authenticated = false;
        }
    }

    pub(crate) fn attach_session(&self, session: Arc<dyn Session>) {
        self.state().session = Some(session);
    }

    pub(crate) fn detach_session(&self) -> Option<Arc<dyn Session>> {
        self.state().session.take()
    }

    /// Drop run-as state in memory and in the current session.
    pub(crate) fn clear_run_as(&self) {
        let mut state = self.state();
        state.run_as.clear();
        if let Some(session) = &state.session {
            session.remove(RUN_AS_KEY);
            save(session.as_ref());
        }
    }

    /// Take on a new identity and persist it when session-backed.
    pub(crate) fn assume_identity(&self, principals: Vec<Principal>, authenticated: bool) {
        let mut state = self.state();
        state.principals = principals;
        state.authenticated = authenticated;
        self.store_identity(&mut state);
    }

    /// Forget the identity and run-as state. Returns the real principals
    /// followed by every assumed one.
    pub(crate) fn reset(&self) -> Vec<Principal> {
        let mut state = self.state();
        let mut departing = std::mem::take(&mut state.principals);
        for principal in state.run_as.principals() {
            if !departing.contains(principal) {
                departing.push(principal.clone());
            }
        }
        state.run_as.clear();
        state.authenticated = false;
        if let Some(session) = &state.session {
            session.remove(RUN_AS_KEY);
        }
        departing
    }

    fn session_locked(&self, state: &mut SubjectState) -> Option<Arc<dyn Session>> {
        if let Some(session) = &state.session {
            if session.is_valid() && !session.is_expired() {
                return Some(Arc::clone(session));
            }
            state.session = None;
        }

        if !self.create_sessions {
            return None;
        }
        let sessions = self.manager.session_manager()?;
        let context = SessionContext {
            ttl: self.session_ttl,
            carrier: self.carrier.clone(),
        };
        match sessions.start(&context) {
            Ok(session) => {
                state.session = Some(Arc::clone(&session));
                Some(session)
            },
            Err(e) => {
                tracing::warn!(error = %e, "No session available");
                None
            },
        }
    }

    fn store_identity(&self, state: &mut SubjectState) {
        let Some(session) = self.session_locked(state) else {
            return;
        };
        match serde_json::to_vec(&state.principals) {
            Ok(bytes) => session.set(PRINCIPALS_KEY, bytes),
            Err(e) => tracing::warn!(session_id = %session.id(), "Failed to encode principals: {e}"),
        }
        match serde_json::to_vec(&state.authenticated) {
            Ok(bytes) => session.set(AUTHENTICATED_KEY, bytes),
            Err(e) => tracing::warn!(session_id = %session.id(), "Failed to encode authenticated flag: {e}"),
        }
        save(session.as_ref());
    }

    fn store_run_as(&self, state: &mut SubjectState) {
        let Some(session) = self.session_locked(state) else {
            return;
        };
        if state.run_as.is_empty() {
            session.remove(RUN_AS_KEY);
        } else {
            match state.run_as.encode() {
                Ok(bytes) => session.set(RUN_AS_KEY, bytes),
                Err(e) => tracing::warn!(session_id = %session.id(), "Failed to encode run-as stack: {e}"),
            }
        }
        save(session.as_ref());
    }

    fn state(&self) -> MutexGuard<'_, SubjectState> {
        self.state.lock().unwrap_or_else(|e| {
            tracing::warn!("Subject lock poisoned, recovering");
            e.into_inner()
        })
    }
}

fn save(session: &dyn Session) {
    if let Err(e) = session.save() {
        tracing::warn!(session_id = %session.id(), error = %e, "Failed to save session");
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let principals: Vec<String> = self.principals().iter().map(ToString::to_string).collect();
        write!(
            f,
            "Subject[{}]({})",
            principals.join(", "),
            self.is_authenticated()
        )
    }
}

impl fmt::Debug for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Subject")
            .field("manager", &self.manager.id())
            .field("principals", &state.principals)
            .field("authenticated", &state.authenticated)
            .field("run_as", &state.run_as.len())
            .field("session", &state.session.as_ref().map(|s| s.id().to_string()))
            .finish_non_exhaustive()
    }
}
