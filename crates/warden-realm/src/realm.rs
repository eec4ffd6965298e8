//! Realm contracts.

use std::fmt;
use std::sync::Arc;

use warden_authc::{AuthenticationInfo, AuthenticationToken, CredentialsMatcher};
use warden_authz::{AuthorizationInfo, Authorizer};
use warden_core::Principal;

use crate::RealmResult;

/// A named source of identity data.
///
/// Optional capabilities are discovered through the `as_*` methods, which
/// return `None` unless the realm implements them.
pub trait Realm: Send + Sync + fmt::Debug {
    /// The realm name.
    fn name(&self) -> &str;

    /// Whether this realm can authenticate `token`.
    fn supports(&self, token: &dyn AuthenticationToken) -> bool;

    /// Look up the stored authentication info for the token's principal.
    ///
    /// Does not check credentials; that is the job of the realm's
    /// [`CredentialsMatcher`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::RealmError::UnknownAccount`] when the principal is not
    /// known, or another [`crate::RealmError`] if the backing store fails.
    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>>;

    /// The matcher used to verify credentials against the looked-up info.
    ///
    /// Realms without a matcher are trusted to have verified the credentials
    /// during lookup.
    fn credentials_matcher(&self) -> Option<&dyn CredentialsMatcher> {
        None
    }

    /// The authorization data capability.
    fn as_authorizing(&self) -> Option<&dyn AuthorizingRealm> {
        None
    }

    /// The direct role/permission query capability.
    fn as_authorizer(&self) -> Option<&dyn Authorizer> {
        None
    }

    /// The cache invalidation capability.
    fn as_cache_aware(&self) -> Option<&dyn CacheAware> {
        None
    }
}

/// A realm that can also supply authorization data.
pub trait AuthorizingRealm: Realm {
    /// Roles and permissions for the given principals.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RealmError::NoPrincipals`] for an empty list,
    /// [`crate::RealmError::UnknownAccount`] when the primary principal is
    /// not known, or a backend error.
    fn authorization_info(&self, principals: &[Principal])
    -> RealmResult<Arc<dyn AuthorizationInfo>>;
}

/// A realm holding cached data that can be invalidated.
pub trait CacheAware: Send + Sync {
    /// Drop every cached entry for each of the principals.
    fn clear_cache(&self, principals: &[Principal]);
}
