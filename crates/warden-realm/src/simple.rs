//! In-memory account realm.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use warden_authc::{
    AuthenticationInfo, AuthenticationToken, CredentialsMatcher, PlainTextMatcher, SimpleAccount,
    TokenKind,
};
use warden_authz::{
    AuthorizationInfo, Authorizer, Permission, SimpleAuthorizationInfo, SimpleRole,
};
use warden_core::Principal;

use crate::{AuthorizingRealm, Realm, RealmError, RealmResult};

/// A realm backed by in-memory account and role maps.
///
/// Accounts are keyed by their primary principal. Only username/password
/// tokens are supported. Credentials are checked with a
/// [`PlainTextMatcher`] unless another matcher is configured.
pub struct SimpleAccountRealm {
    name: String,
    accounts: RwLock<HashMap<Principal, Arc<SimpleAccount>>>,
    roles: RwLock<HashMap<String, SimpleRole>>,
    matcher: Arc<dyn CredentialsMatcher>,
}

impl SimpleAccountRealm {
    /// Create an empty realm.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accounts: RwLock::new(HashMap::new()),
            roles: RwLock::new(HashMap::new()),
            matcher: Arc::new(PlainTextMatcher),
        }
    }

    /// Use a different credentials matcher.
    #[must_use]
    pub fn with_credentials_matcher(mut self, matcher: Arc<dyn CredentialsMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Add or replace an account, keyed by its primary principal.
    pub fn add_account(&self, account: SimpleAccount) {
        let Some(key) = account.principals().first().cloned() else {
            tracing::warn!(realm = %self.name, "Ignoring account without principals");
            return;
        };
        if self.write_accounts().insert(key.clone(), Arc::new(account)).is_some() {
            tracing::debug!(realm = %self.name, principal = %key, "Replaced existing account");
        }
    }

    /// Add a username/password account with the given roles.
    pub fn add_user(&self, username: &str, password: impl AsRef<[u8]>, roles: &[&str]) {
        let mut account = SimpleAccount::new(username, password.as_ref().to_vec(), &self.name);
        for role in roles {
            account.add_role(*role);
        }
        self.add_account(account);
    }

    /// Add or replace a role.
    pub fn add_role(&self, role: SimpleRole) {
        self.write_roles().insert(role.name().to_string(), role);
    }

    /// Whether an account exists for `principal`.
    #[must_use]
    pub fn has_account(&self, principal: &Principal) -> bool {
        self.read_accounts().contains_key(principal)
    }

    /// Number of accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.read_accounts().len()
    }

    /// Number of roles.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.read_roles().len()
    }

    fn account(&self, principal: &Principal) -> Option<Arc<SimpleAccount>> {
        self.read_accounts().get(principal).cloned()
    }

    fn primary_account(&self, principals: &[Principal]) -> RealmResult<Arc<SimpleAccount>> {
        let primary = principals.first().ok_or(RealmError::NoPrincipals)?;
        self.account(primary)
            .ok_or_else(|| RealmError::UnknownAccount {
                principal: primary.to_string(),
            })
    }

    /// Whether the account or any of its roles grants `permission`.
    fn account_permits(&self, account: &SimpleAccount, permission: &Permission) -> bool {
        if account.implies(permission) {
            return true;
        }
        let roles = self.read_roles();
        account
            .roles()
            .iter()
            .filter_map(|name| roles.get(name))
            .any(|role| role.is_permitted(permission))
    }

    fn read_accounts(&self) -> RwLockReadGuard<'_, HashMap<Principal, Arc<SimpleAccount>>> {
        self.accounts.read().unwrap_or_else(|e| {
            tracing::warn!("SimpleAccountRealm accounts lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_accounts(&self) -> RwLockWriteGuard<'_, HashMap<Principal, Arc<SimpleAccount>>> {
        self.accounts.write().unwrap_or_else(|e| {
            tracing::warn!("SimpleAccountRealm accounts lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn read_roles(&self) -> RwLockReadGuard<'_, HashMap<String, SimpleRole>> {
        self.roles.read().unwrap_or_else(|e| {
            tracing::warn!("SimpleAccountRealm roles lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn write_roles(&self) -> RwLockWriteGuard<'_, HashMap<String, SimpleRole>> {
        self.roles.write().unwrap_or_else(|e| {
            tracing::warn!("SimpleAccountRealm roles lock poisoned, recovering");
            e.into_inner()
        })
    }
}

impl Realm for SimpleAccountRealm {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, token: &dyn AuthenticationToken) -> bool {
        token.kind() == TokenKind::UsernamePassword
    }

    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>> {
        let principal = token.principal();
        match self.account(&principal) {
            Some(account) => Ok(account),
            None => {
                tracing::trace!(realm = %self.name, %principal, "Account not found");
                Err(RealmError::UnknownAccount {
                    principal: principal.to_string(),
                })
            },
        }
    }

    fn credentials_matcher(&self) -> Option<&dyn CredentialsMatcher> {
        Some(self.matcher.as_ref())
    }

    fn as_authorizing(&self) -> Option<&dyn AuthorizingRealm> {
        Some(self)
    }

    fn as_authorizer(&self) -> Option<&dyn Authorizer> {
        Some(self)
    }
}

impl AuthorizingRealm for SimpleAccountRealm {
    fn authorization_info(
        &self,
        principals: &[Principal],
    ) -> RealmResult<Arc<dyn AuthorizationInfo>> {
        let account = self.primary_account(principals)?;

        let mut info = SimpleAuthorizationInfo::new();
        for permission in AuthorizationInfo::permissions(account.as_ref()) {
            info.add_permission(permission.clone());
        }

        let roles = self.read_roles();
        for name in account.roles() {
            info.add_role(name.clone());
            if let Some(role) = roles.get(name) {
                for permission in role.permissions() {
                    info.add_permission(permission.clone());
                }
            }
        }

        Ok(Arc::new(info))
    }
}

impl Authorizer for SimpleAccountRealm {
    fn has_role(&self, principals: &[Principal], role: &str) -> bool {
        self.primary_account(principals)
            .is_ok_and(|account| account.roles().contains(role))
    }

    fn is_permitted(&self, principals: &[Principal], permission: &Permission) -> bool {
        self.primary_account(principals)
            .is_ok_and(|account| self.account_permits(&account, permission))
    }
}

impl fmt::Debug for SimpleAccountRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAccountRealm")
            .field("name", &self.name)
            .field("accounts", &self.account_count())
            .field("roles", &self.role_count())
            .field("matcher", &self.matcher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_authc::{HashAlgorithm, HashedMatcher, UsernamePasswordToken, hash_credentials};

    fn realm() -> SimpleAccountRealm {
        let realm = SimpleAccountRealm::new("memory");
        realm.add_user("foo", "password", &["manager"]);
        realm.add_role(
            SimpleRole::new("manager")
                .with_permission("write:*".parse().unwrap())
                .with_permission("manage:*".parse().unwrap()),
        );
        realm
    }

    fn foo() -> Vec<Principal> {
        vec![Principal::name("foo")]
    }

    #[test]
    fn test_supports_username_password_only() {
        #[derive(Debug)]
        struct ApiKey;
        impl AuthenticationToken for ApiKey {
            fn principal(&self) -> Principal {
                Principal::name("svc")
            }
            fn credentials(&self) -> &[u8] {
                b"key"
            }
            fn kind(&self) -> TokenKind {
                TokenKind::Other("api_key")
            }
        }

        let realm = realm();
        assert!(realm.supports(&UsernamePasswordToken::new("foo", "password")));
        assert!(!realm.supports(&ApiKey));
    }

    #[test]
    fn test_authentication_info_lookup() {
        let realm = realm();
        let info = realm
            .authentication_info(&UsernamePasswordToken::new("foo", "ignored"))
            .unwrap();
        assert_eq!(info.principals(), foo().as_slice());
        assert_eq!(info.credentials(), b"password");

        let err = realm
            .authentication_info(&UsernamePasswordToken::new("nobody", "x"))
            .unwrap_err();
        assert!(err.is_unknown_account());
    }

    #[test]
    fn test_authorization_info_unions_role_permissions() {
        let realm = realm();
        let info = realm.authorization_info(&foo()).unwrap();
        assert!(info.has_role("manager"));
        assert!(info.implies(&"write:anything".parse().unwrap()));
        assert!(info.implies(&"manage:users".parse().unwrap()));
        assert!(!info.implies(&"read:anything".parse().unwrap()));

        assert!(matches!(
            realm.authorization_info(&[]),
            Err(RealmError::NoPrincipals)
        ));
    }

    #[test]
    fn test_authorizer_queries() {
        let realm = realm();
        assert!(realm.has_role(&foo(), "manager"));
        assert!(!realm.has_role(&foo(), "admin"));
        assert!(realm.is_permitted_str(&foo(), "write:doc"));
        assert!(!realm.is_permitted_str(&foo(), "read:doc"));
        assert!(!realm.is_permitted_str(&foo(), ":::"));
        assert!(!realm.is_permitted_str(&[], "write:doc"));
        assert!(!realm.is_permitted_str(&[Principal::name("bar")], "write:doc"));
    }

    #[test]
    fn test_direct_account_permissions() {
        let realm = SimpleAccountRealm::new("memory");
        let mut account = SimpleAccount::new("svc", b"pw".to_vec(), "memory");
        account.add_permission("reports:read").unwrap();
        realm.add_account(account);

        let principals = [Principal::name("svc")];
        assert!(realm.is_permitted_str(&principals, "reports:read:q3"));
        assert!(!realm.is_permitted_str(&principals, "reports:write"));
    }

    #[test]
    fn test_custom_matcher_is_exposed() {
        let stored = hash_credentials(HashAlgorithm::Sha256, None, b"pw", 1);
        let realm = SimpleAccountRealm::new("hashed").with_credentials_matcher(Arc::new(
            HashedMatcher::with_algorithm(HashAlgorithm::Sha256, 1),
        ));
        realm.add_account(SimpleAccount::new("foo", stored, "hashed"));

        let token = UsernamePasswordToken::new("foo", "pw");
        let info = realm.authentication_info(&token).unwrap();
        assert!(realm.credentials_matcher().unwrap().matches(&token, info.as_ref()));
    }
}
