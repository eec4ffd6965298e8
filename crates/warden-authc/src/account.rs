//! Full accounts: authentication and authorization data in one value.

use std::collections::BTreeSet;
use std::fmt;

use warden_authz::{AuthorizationInfo, Permission, PermissionResult};
use warden_core::Principal;

use crate::info::merge_principals;
use crate::{AuthenticationInfo, MergeableAuthenticationInfo};

/// An account known to a realm.
///
/// Carries principals, stored credentials with an optional salt, role names
/// and direct permissions, plus the name of the realm that owns it.
#[derive(Clone)]
pub struct SimpleAccount {
    principals: Vec<Principal>,
    credentials: Vec<u8>,
    salt: Option<Vec<u8>>,
    roles: BTreeSet<String>,
    permissions: Vec<Permission>,
    realm: String,
}

impl SimpleAccount {
    /// Create an account with one principal and no roles.
    #[must_use]
    pub fn new(
        principal: impl Into<Principal>,
        credentials: Vec<u8>,
        realm: impl Into<String>,
    ) -> Self {
        Self {
            principals: vec![principal.into()],
            credentials,
            salt: None,
            roles: BTreeSet::new(),
            permissions: Vec::new(),
            realm: realm.into(),
        }
    }

    /// Attach a credentials salt.
    #[must_use]
    pub fn with_salt(mut self, salt: Vec<u8>) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Name of the owning realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Grant a role.
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    /// Parse and grant a direct permission.
    ///
    /// # Errors
    ///
    /// Returns a [`warden_authz::PermissionError`] if the string is malformed.
    pub fn add_permission(&mut self, permission: &str) -> PermissionResult<()> {
        self.add_permission_value(Permission::parse(permission)?);
        Ok(())
    }

    /// Grant an already-parsed direct permission.
    pub fn add_permission_value(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }
}

impl AuthenticationInfo for SimpleAccount {
    fn principals(&self) -> &[Principal] {
        &self.principals
    }

    fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    fn credentials_salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    fn as_mergeable(&mut self) -> Option<&mut dyn MergeableAuthenticationInfo> {
        Some(self)
    }
}

impl MergeableAuthenticationInfo for SimpleAccount {
    fn merge(&mut self, other: &dyn AuthenticationInfo) {
        merge_principals(&mut self.principals, other.principals());
    }
}

impl AuthorizationInfo for SimpleAccount {
    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

impl fmt::Debug for SimpleAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAccount")
            .field("principals", &self.principals)
            .field("realm", &self.realm)
            .field("roles", &self.roles)
            .field("permissions", &self.permissions.len())
            .finish_non_exhaustive()
    }
}
