//! The security manager.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;
use warden_authc::AuthenticationToken;
use warden_authz::{Authorizer, Permission};
use warden_core::Principal;
use warden_realm::Realm;
use warden_session::{SessionContext, SessionKey, SessionManager};

use crate::strategy::{Aggregate, AtLeastOneSuccessfulStrategy, AuthenticationStrategy};
use crate::{SecurityError, SecurityResult, Subject, SubjectContext};

/// Orchestrates realms, the authentication strategy and sessions.
///
/// One manager is meant to be built per application and shared behind an
/// [`Arc`]. Realms are consulted strictly in the order they were added.
pub struct SecurityManager {
    id: Uuid,
    realms: RwLock<Vec<Arc<dyn Realm>>>,
    strategy: RwLock<Option<Arc<dyn AuthenticationStrategy>>>,
    session_manager: Option<Arc<dyn SessionManager>>,
    warned_unconfigured: AtomicBool,
}

impl SecurityManager {
    /// Start building a manager.
    #[must_use]
    pub fn builder() -> SecurityManagerBuilder {
        SecurityManagerBuilder::default()
    }

    /// Unique id of this manager instance.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Append a realm. Realms are consulted in the order they were added.
    pub fn add_realm(&self, realm: Arc<dyn Realm>) {
        tracing::debug!(manager = %self.id, realm = %realm.name(), "Adding realm");
        self.write_realms().push(realm);
    }

    /// Replace every realm with `realm`.
    pub fn set_realm(&self, realm: Arc<dyn Realm>) {
        tracing::debug!(manager = %self.id, realm = %realm.name(), "Replacing all realms");
        *self.write_realms() = vec![realm];
    }

    /// Replace every realm with `realms`, keeping their order.
    pub fn set_realms(&self, realms: Vec<Arc<dyn Realm>>) {
        *self.write_realms() = realms;
    }

    /// Snapshot of the configured realms.
    #[must_use]
    pub fn realms(&self) -> Vec<Arc<dyn Realm>> {
        self.read_realms().clone()
    }

    /// Replace the authentication strategy.
    pub fn set_strategy(&self, strategy: Arc<dyn AuthenticationStrategy>) {
        *self.strategy.write().unwrap_or_else(|e| {
            tracing::warn!("SecurityManager strategy lock poisoned, recovering");
            e.into_inner()
        }) = Some(strategy);
    }

    /// The configured authentication strategy.
    #[must_use]
    pub fn strategy(&self) -> Option<Arc<dyn AuthenticationStrategy>> {
        self.strategy
            .read()
            .unwrap_or_else(|e| {
                tracing::warn!("SecurityManager strategy lock poisoned, recovering");
                e.into_inner()
            })
            .clone()
    }

    /// The session manager, if sessions are enabled.
    #[must_use]
    pub fn session_manager(&self) -> Option<&Arc<dyn SessionManager>> {
        self.session_manager.as_ref()
    }

    /// Authenticate `token` across every realm through the strategy.
    ///
    /// Returns the aggregate of all successful realm results.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Configuration`] when no realm or no strategy
    /// is configured, otherwise the first error raised by the strategy, a
    /// realm lookup or a credentials check.
    pub fn authenticate(&self, token: &dyn AuthenticationToken) -> SecurityResult<Aggregate> {
        let realms = self.realms();
        if realms.is_empty() {
            return Err(SecurityError::Configuration(
                "no realms are configured".to_string(),
            ));
        }
        let strategy = self.strategy().ok_or_else(|| {
            SecurityError::Configuration("no authentication strategy is configured".to_string())
        })?;

        let principal = token.principal();
        tracing::debug!(%principal, realms = realms.len(), "Authenticating");

        let mut aggregate = strategy.before_all_attempts(&realms, token)?;

        for realm in &realms {
            aggregate = strategy.before_attempt(realm.as_ref(), token, aggregate)?;

            if !realm.supports(token) {
                continue;
            }

            let (info, error) = match attempt(realm.as_ref(), token) {
                Ok(info) => (Some(info), None),
                Err(e) => (None, Some(e)),
            };
            aggregate = strategy
                .after_attempt(realm.as_ref(), token, info.as_deref(), aggregate, error)
                .inspect_err(|e| {
                    tracing::debug!(%principal, realm = %realm.name(), error = %e, "Authentication aborted");
                })?;
        }

        strategy
            .after_all_attempts(token, aggregate)
            .inspect_err(|e| {
                tracing::debug!(%principal, error = %e, "No valid authentication achieved");
            })
    }

    /// Build a subject bound to this manager.
    ///
    /// With sessions enabled in both the manager and `context`, the subject
    /// resumes `context.session_id` when it is still live (restoring the
    /// stored identity) or starts a new session.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::Session`] if a new session cannot be started.
    pub fn create_subject(self: &Arc<Self>, context: SubjectContext) -> SecurityResult<Subject> {
        if self.read_realms().is_empty() && !self.warned_unconfigured.swap(true, Ordering::Relaxed)
        {
            tracing::warn!(
                manager = %self.id,
                "No realms are configured; subjects can be created but permission checks will fail"
            );
        }

        let subject = Subject::new(Arc::clone(self), &context);

        if let Some(sessions) = self.session_manager.as_ref().filter(|_| context.create_sessions) {
            let resumed = context.session_id.as_deref().and_then(|id| {
                let mut key = SessionKey::new(id);
                key.carrier.clone_from(&context.carrier);
                let session = sessions.get(&key);
                if session.is_none() {
                    tracing::debug!(session_id = %id, "Session to resume is gone, starting a new one");
                }
                session
            });

            match resumed {
                Some(session) => {
                    subject.attach_session(session);
                    subject.load();
                },
                None => {
                    let session = sessions.start(&SessionContext {
                        ttl: context.session_ttl,
                        carrier: context.carrier.clone(),
                    })?;
                    subject.attach_session(session);
                },
            }
        }

        tracing::trace!(%subject, "Created subject");
        Ok(subject)
    }

    /// Log `subject` in with `token`.
    ///
    /// Any run-as state is dropped first. On success the subject takes the
    /// aggregate principals, is marked authenticated and, when session-backed,
    /// persists both.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::ForeignSubject`] for a subject created by
    /// another manager, otherwise the error of [`SecurityManager::authenticate`].
    pub fn login(&self, subject: &Subject, token: &dyn AuthenticationToken) -> SecurityResult<()> {
        self.ensure_owned(subject)?;
        subject.clear_run_as();

        let info = self.authenticate(token)?;
        subject.assume_identity(info.principals().to_vec(), true);

        tracing::debug!(%subject, "Login succeeded");
        Ok(())
    }

    /// Log `subject` out.
    ///
    /// Drops run-as state, clears the principals and authenticated flag,
    /// evicts the real and every assumed principal from caching realms and
    /// invalidates the bound session.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::ForeignSubject`] for a subject created by
    /// another manager.
    pub fn logout(&self, subject: &Subject) -> SecurityResult<()> {
        self.ensure_owned(subject)?;

        let departing = subject.reset();
        tracing::debug!(principals = ?departing, "Logging out");

        if !departing.is_empty() {
            for realm in self.realms() {
                if let Some(cache) = realm.as_cache_aware() {
                    cache.clear_cache(&departing);
                }
            }
        }

        if let Some(session) = subject.detach_session()
            && let Some(sessions) = &self.session_manager
        {
            sessions.invalidate(&SessionKey::of(session.as_ref()));
        }
        Ok(())
    }

    fn ensure_owned(&self, subject: &Subject) -> SecurityResult<()> {
        if subject.manager().id() == self.id {
            Ok(())
        } else {
            Err(SecurityError::ForeignSubject)
        }
    }

    fn read_realms(&self) -> RwLockReadGuard<'_, Vec<Arc<dyn Realm>>> {
        self.realms.read().unwrap_or_else(|e| {
            tracing::warn!("SecurityManager realms lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_realms(&self) -> RwLockWriteGuard<'_, Vec<Arc<dyn Realm>>> {
        self.realms.write().unwrap_or_else(|e| {
            tracing::warn!("SecurityManager realms lock poisoned, recovering");
            e.into_inner()
        })
    }
}

/// Look up the token in one realm and verify its credentials.
fn attempt(
    realm: &dyn Realm,
    token: &dyn AuthenticationToken,
) -> SecurityResult<Arc<dyn warden_authc::AuthenticationInfo>> {
    let info = realm.authentication_info(token)?;
    if let Some(matcher) = realm.credentials_matcher()
        && !matcher.matches(token, info.as_ref())
    {
        tracing::debug!(realm = %realm.name(), "Account found but credentials did not match");
        return Err(SecurityError::IncorrectCredentials);
    }
    Ok(info)
}

fn realm_has_role(realm: &dyn Realm, principals: &[Principal], role: &str) -> bool {
    if let Some(authorizer) = realm.as_authorizer() {
        return authorizer.has_role(principals, role);
    }
    realm
        .as_authorizing()
        .and_then(|r| r.authorization_info(principals).ok())
        .is_some_and(|info| info.has_role(role))
}

fn realm_permits(realm: &dyn Realm, principals: &[Principal], permission: &Permission) -> bool {
    if let Some(authorizer) = realm.as_authorizer() {
        return authorizer.is_permitted(principals, permission);
    }
    realm
        .as_authorizing()
        .and_then(|r| r.authorization_info(principals).ok())
        .is_some_and(|info| info.implies(permission))
}

impl Authorizer for SecurityManager {
    fn has_role(&self, principals: &[Principal], role: &str) -> bool {
        if principals.is_empty() {
            return false;
        }
        self.realms()
            .iter()
            .any(|realm| realm_has_role(realm.as_ref(), principals, role))
    }

    fn is_permitted(&self, principals: &[Principal], permission: &Permission) -> bool {
        if principals.is_empty() {
            return false;
        }
        self.realms()
            .iter()
            .any(|realm| realm_permits(realm.as_ref(), principals, permission))
    }
}

impl fmt::Debug for SecurityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let realms: Vec<String> = self
            .read_realms()
            .iter()
            .map(|r| r.name().to_string())
            .collect();
        f.debug_struct("SecurityManager")
            .field("id", &self.id)
            .field("realms", &realms)
            .field("strategy", &self.strategy())
            .field("sessions", &self.session_manager.is_some())
            .finish()
    }
}

/// Builder for [`SecurityManager`].
///
/// Defaults to [`AtLeastOneSuccessfulStrategy`], no realms and no sessions.
pub struct SecurityManagerBuilder {
    realms: Vec<Arc<dyn Realm>>,
    strategy: Option<Arc<dyn AuthenticationStrategy>>,
    session_manager: Option<Arc<dyn SessionManager>>,
}

impl Default for SecurityManagerBuilder {
    fn default() -> Self {
        Self {
            realms: Vec::new(),
            strategy: Some(Arc::new(AtLeastOneSuccessfulStrategy)),
            session_manager: None,
        }
    }
}

impl SecurityManagerBuilder {
    /// Append a realm.
    #[must_use]
    pub fn realm(mut self, realm: Arc<dyn Realm>) -> Self {
        self.realms.push(realm);
        self
    }

    /// Use `strategy` to combine realm results.
    #[must_use]
    pub fn strategy(mut self, strategy: Arc<dyn AuthenticationStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Build without a strategy. Authentication fails with a configuration
    /// error until [`SecurityManager::set_strategy`] is called.
    #[must_use]
    pub fn without_strategy(mut self) -> Self {
        self.strategy = None;
        self
    }

    /// Enable sessions.
    #[must_use]
    pub fn session_manager(mut self, session_manager: Arc<dyn SessionManager>) -> Self {
        self.session_manager = Some(session_manager);
        self
    }

    /// Build the manager.
    #[must_use]
    pub fn build(self) -> Arc<SecurityManager> {
        Arc::new(SecurityManager {
            id: Uuid::new_v4(),
            realms: RwLock::new(self.realms),
            strategy: RwLock::new(self.strategy),
            session_manager: self.session_manager,
            warned_unconfigured: AtomicBool::new(false),
        })
    }
}

impl fmt::Debug for SecurityManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityManagerBuilder")
            .field("realms", &self.realms.len())
            .field("strategy", &self.strategy)
            .field("sessions", &self.session_manager.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AllSuccessfulStrategy;
    use warden_authc::UsernamePasswordToken;
    use warden_authz::SimpleRole;
    use warden_realm::SimpleAccountRealm;

    fn users() -> Arc<SimpleAccountRealm> {
        let realm = SimpleAccountRealm::new("users");
        realm.add_user("foo", "password", &["manager"]);
        realm.add_role(
            SimpleRole::new("manager")
                .with_permission("write:*".parse().unwrap())
                .with_permission("manage:*".parse().unwrap()),
        );
        Arc::new(realm)
    }

    fn foo() -> Vec<Principal> {
        vec![Principal::name("foo")]
    }

    #[test]
    fn test_authenticate_requires_realms() {
        let manager = SecurityManager::builder().build();
        let err = manager
            .authenticate(&UsernamePasswordToken::new("foo", "password"))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_authenticate_requires_strategy() {
        let manager = SecurityManager::builder()
            .realm(users())
            .without_strategy()
            .build();
        let err = manager
            .authenticate(&UsernamePasswordToken::new("foo", "password"))
            .unwrap_err();
        assert!(err.is_configuration());

        manager.set_strategy(Arc::new(AllSuccessfulStrategy));
        assert!(manager
            .authenticate(&UsernamePasswordToken::new("foo", "password"))
            .is_ok());
    }

    #[test]
    fn test_authenticate_checks_credentials() {
        let manager = SecurityManager::builder()
            .realm(users())
            .strategy(Arc::new(AllSuccessfulStrategy))
            .build();

        let info = manager
            .authenticate(&UsernamePasswordToken::new("foo", "password"))
            .unwrap();
        assert_eq!(info.principals(), foo().as_slice());

        let err = manager
            .authenticate(&UsernamePasswordToken::new("foo", "wrong"))
            .unwrap_err();
        assert!(matches!(err, SecurityError::IncorrectCredentials));

        let err = manager
            .authenticate(&UsernamePasswordToken::new("nobody", "password"))
            .unwrap_err();
        assert!(matches!(err, SecurityError::UnknownAccount { .. }));
    }

    #[test]
    fn test_authorizer_queries() {
        let manager = SecurityManager::builder().realm(users()).build();
        assert!(manager.has_role(&foo(), "manager"));
        assert!(!manager.has_role(&foo(), "admin"));
        assert!(manager.is_permitted_str(&foo(), "write:anything"));
        assert!(!manager.is_permitted_str(&foo(), "read:anything"));
        assert!(!manager.is_permitted_str(&foo(), ""));
        assert!(!manager.is_permitted_str(&[], "write:anything"));
        assert!(!manager.has_role(&[], "manager"));
    }

    #[test]
    fn test_set_realm_replaces_all() {
        let manager = SecurityManager::builder()
            .realm(users())
            .realm(Arc::new(SimpleAccountRealm::new("other")))
            .build();
        assert_eq!(manager.realms().len(), 2);

        manager.set_realm(Arc::new(SimpleAccountRealm::new("only")));
        let names: Vec<String> = manager.realms().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["only".to_string()]);

        manager.add_realm(users());
        assert_eq!(manager.realms().len(), 2);
    }

    #[test]
    fn test_foreign_subject_is_rejected() {
        let ours = SecurityManager::builder().realm(users()).build();
        let theirs = SecurityManager::builder().realm(users()).build();

        let subject = theirs.create_subject(SubjectContext::new()).unwrap();
        let err = ours
            .login(&subject, &UsernamePasswordToken::new("foo", "password"))
            .unwrap_err();
        assert!(matches!(err, SecurityError::ForeignSubject));
        assert!(matches!(ours.logout(&subject), Err(SecurityError::ForeignSubject)));
    }
}
