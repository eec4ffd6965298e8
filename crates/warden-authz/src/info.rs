//! Authorization data attached to an identity.

use std::collections::BTreeSet;

use crate::Permission;

/// The roles and permissions granted to an identity.
///
/// Produced by a realm per lookup (or served from a cache) and read-only to
/// callers.
pub trait AuthorizationInfo: Send + Sync + std::fmt::Debug {
    /// Role names held by the identity.
    fn roles(&self) -> &BTreeSet<String>;

    /// Permissions granted to the identity, including those derived from roles.
    fn permissions(&self) -> &[Permission];

    /// Whether the identity holds `role`.
    fn has_role(&self, role: &str) -> bool {
        self.roles().contains(role)
    }

    /// Whether any granted permission implies `permission`.
    fn implies(&self, permission: &Permission) -> bool {
        self.permissions().iter().any(|p| p.implies(permission))
    }
}

/// A plain [`AuthorizationInfo`] value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleAuthorizationInfo {
    roles: BTreeSet<String>,
    permissions: Vec<Permission>,
}

impl SimpleAuthorizationInfo {
    /// Create an empty authorization info.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role name.
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    /// Add a permission. Duplicates are skipped.
    pub fn add_permission(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    /// Builder form of [`Self::add_role`].
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.add_role(role);
        self
    }

    /// Builder form of [`Self::add_permission`].
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.add_permission(permission);
        self
    }
}

impl AuthorizationInfo for SimpleAuthorizationInfo {
    fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}
