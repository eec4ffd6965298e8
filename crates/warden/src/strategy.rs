//! Policies for combining the results of several realms into one login.
//!
//! For one `authenticate` call the [`SecurityManager`](crate::SecurityManager)
//! invokes the hooks in a fixed order:
//!
//! 1. [`before_all_attempts`](AuthenticationStrategy::before_all_attempts)
//!    seeds the aggregate.
//! 2. For each realm, in configuration order:
//!    [`before_attempt`](AuthenticationStrategy::before_attempt), then (if
//!    the realm supports the token) the realm lookup and credentials check,
//!    then [`after_attempt`](AuthenticationStrategy::after_attempt).
//! 3. [`after_all_attempts`](AuthenticationStrategy::after_all_attempts)
//!    validates the final aggregate.
//!
//! Any hook returning an error stops the remaining steps.

use std::fmt;
use std::sync::Arc;

use warden_authc::{
    AuthenticationInfo, AuthenticationToken, MergeableAuthenticationInfo,
    SimpleAuthenticationInfo,
};
use warden_realm::Realm;

use crate::{SecurityError, SecurityResult};

/// The combined authentication result of one login attempt.
pub type Aggregate = Box<dyn AuthenticationInfo>;

/// Controls how realm results combine and when a login fails early.
pub trait AuthenticationStrategy: Send + Sync + fmt::Debug {
    /// Seed the aggregate. The default is an empty, mergeable info.
    ///
    /// # Errors
    ///
    /// Returning an error fails the whole attempt.
    fn before_all_attempts(
        &self,
        _realms: &[Arc<dyn Realm>],
        _token: &dyn AuthenticationToken,
    ) -> SecurityResult<Aggregate> {
        Ok(Box::new(SimpleAuthenticationInfo::empty()))
    }

    /// Called before a realm is consulted.
    ///
    /// # Errors
    ///
    /// Returning an error vetoes the realm and fails the attempt.
    fn before_attempt(
        &self,
        _realm: &dyn Realm,
        _token: &dyn AuthenticationToken,
        aggregate: Aggregate,
    ) -> SecurityResult<Aggregate> {
        Ok(aggregate)
    }

    /// Called after a supporting realm was consulted, with its info on
    /// success or the lookup/credentials error on failure.
    ///
    /// # Errors
    ///
    /// Returning an error aborts the remaining realms.
    fn after_attempt(
        &self,
        realm: &dyn Realm,
        token: &dyn AuthenticationToken,
        info: Option<&dyn AuthenticationInfo>,
        aggregate: Aggregate,
        error: Option<SecurityError>,
    ) -> SecurityResult<Aggregate>;

    /// Validate the final aggregate. The default rejects an aggregate
    /// without principals.
    ///
    /// # Errors
    ///
    /// Returns [`SecurityError::NoRealmAuthenticated`] by default when no
    /// principal was collected.
    fn after_all_attempts(
        &self,
        _token: &dyn AuthenticationToken,
        aggregate: Aggregate,
    ) -> SecurityResult<Aggregate> {
        if aggregate.principals().is_empty() {
            return Err(SecurityError::NoRealmAuthenticated);
        }
        Ok(aggregate)
    }
}

/// Fold a single-realm result into the aggregate.
///
/// A mergeable aggregate absorbs the new principals. An aggregate that is
/// not mergeable is replaced while it is still empty and rejected once it
/// holds principals.
///
/// # Errors
///
/// Returns [`SecurityError::NotMergeable`] when a populated aggregate
/// cannot absorb `info`.
pub fn merge_into(aggregate: &mut Aggregate, info: &dyn AuthenticationInfo) -> SecurityResult<()> {
    if let Some(mergeable) = aggregate.as_mergeable() {
        mergeable.merge(info);
        return Ok(());
    }

    if aggregate.principals().is_empty() {
        let mut fresh = SimpleAuthenticationInfo::empty();
        fresh.merge(info);
        *aggregate = Box::new(fresh);
        return Ok(());
    }

    tracing::warn!(
        aggregate = ?aggregate,
        "Aggregate cannot merge authentication info, failing the attempt"
    );
    Err(SecurityError::NotMergeable)
}

/// Every realm must support the token, find the account and accept the
/// credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllSuccessfulStrategy;

impl AuthenticationStrategy for AllSuccessfulStrategy {
    fn before_attempt(
        &self,
        realm: &dyn Realm,
        token: &dyn AuthenticationToken,
        aggregate: Aggregate,
    ) -> SecurityResult<Aggregate> {
        if !realm.supports(token) {
            return Err(SecurityError::UnsupportedToken {
                realm: realm.name().to_string(),
            });
        }
        Ok(aggregate)
    }

    fn after_attempt(
        &self,
        realm: &dyn Realm,
        _token: &dyn AuthenticationToken,
        info: Option<&dyn AuthenticationInfo>,
        mut aggregate: Aggregate,
        error: Option<SecurityError>,
    ) -> SecurityResult<Aggregate> {
        if let Some(error) = error {
            return Err(error);
        }
        let info = info.ok_or_else(|| SecurityError::MissingAccount {
            realm: realm.name().to_string(),
        })?;
        merge_into(&mut aggregate, info)?;
        Ok(aggregate)
    }
}

/// Succeeds when at least one realm authenticates the token.
///
/// Failures of individual realms, including credential mismatches, only
/// leave the aggregate unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtLeastOneSuccessfulStrategy;

impl AuthenticationStrategy for AtLeastOneSuccessfulStrategy {
    fn after_attempt(
        &self,
        realm: &dyn Realm,
        _token: &dyn AuthenticationToken,
        info: Option<&dyn AuthenticationInfo>,
        mut aggregate: Aggregate,
        error: Option<SecurityError>,
    ) -> SecurityResult<Aggregate> {
        if let Some(error) = error {
            tracing::debug!(realm = %realm.name(), %error, "Realm did not authenticate token");
            return Ok(aggregate);
        }
        if let Some(info) = info {
            merge_into(&mut aggregate, info)?;
        }
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_authc::{SimpleAccount, UsernamePasswordToken};
    use warden_core::Principal;
    use warden_realm::SimpleAccountRealm;

    #[derive(Debug)]
    struct Fixed(SimpleAuthenticationInfo);

    impl AuthenticationInfo for Fixed {
        fn principals(&self) -> &[Principal] {
            self.0.principals()
        }

        fn credentials(&self) -> &[u8] {
            self.0.credentials()
        }
    }

    fn realm() -> SimpleAccountRealm {
        SimpleAccountRealm::new("memory")
    }

    fn token() -> UsernamePasswordToken {
        UsernamePasswordToken::new("foo", "pw")
    }

    #[test]
    fn test_merge_into_extends_mergeable_aggregate() {
        let mut aggregate: Aggregate = Box::new(SimpleAuthenticationInfo::empty());
        merge_into(&mut aggregate, &SimpleAccount::new("foo", Vec::new(), "a")).unwrap();
        merge_into(&mut aggregate, &SimpleAccount::new("bar", Vec::new(), "b")).unwrap();
        merge_into(&mut aggregate, &SimpleAccount::new("foo", Vec::new(), "c")).unwrap();
        assert_eq!(
            aggregate.principals(),
            &[Principal::name("foo"), Principal::name("bar")]
        );
    }

    #[test]
    fn test_merge_into_replaces_empty_unmergeable_aggregate() {
        let mut aggregate: Aggregate = Box::new(Fixed(SimpleAuthenticationInfo::empty()));
        merge_into(&mut aggregate, &SimpleAccount::new("foo", Vec::new(), "a")).unwrap();
        assert_eq!(aggregate.principals(), &[Principal::name("foo")]);
    }

    #[test]
    fn test_merge_into_rejects_populated_unmergeable_aggregate() {
        let mut aggregate: Aggregate =
            Box::new(Fixed(SimpleAuthenticationInfo::new("foo", Vec::new())));
        let err = merge_into(&mut aggregate, &SimpleAccount::new("bar", Vec::new(), "a"))
            .unwrap_err();
        assert!(matches!(err, SecurityError::NotMergeable));
    }

    #[test]
    fn test_all_successful_propagates_errors() {
        let strategy = AllSuccessfulStrategy;
        let realm = realm();
        let aggregate = strategy.before_all_attempts(&[], &token()).unwrap();

        let err = strategy
            .after_attempt(
                &realm,
                &token(),
                None,
                aggregate,
                Some(SecurityError::IncorrectCredentials),
            )
            .unwrap_err();
        assert!(matches!(err, SecurityError::IncorrectCredentials));
    }

    #[test]
    fn test_all_successful_requires_info() {
        let strategy = AllSuccessfulStrategy;
        let aggregate = strategy.before_all_attempts(&[], &token()).unwrap();
        let err = strategy
            .after_attempt(&realm(), &token(), None, aggregate, None)
            .unwrap_err();
        assert!(matches!(err, SecurityError::MissingAccount { realm } if realm == "memory"));
    }

    #[test]
    fn test_at_least_one_tolerates_failures() {
        let strategy = AtLeastOneSuccessfulStrategy;
        let aggregate = strategy.before_all_attempts(&[], &token()).unwrap();
        let aggregate = strategy
            .after_attempt(
                &realm(),
                &token(),
                None,
                aggregate,
                Some(SecurityError::IncorrectCredentials),
            )
            .unwrap();
        assert!(aggregate.principals().is_empty());

        let err = strategy.after_all_attempts(&token(), aggregate).unwrap_err();
        assert!(matches!(err, SecurityError::NoRealmAuthenticated));
    }
}
