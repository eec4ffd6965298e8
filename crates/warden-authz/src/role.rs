//! Named permission bundles.

use std::fmt;

use crate::{Permission, PermissionResult};

/// A role: a name and the permissions it grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleRole {
    name: String,
    permissions: Vec<Permission>,
}

impl SimpleRole {
    /// Create a role without permissions.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// The role name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permissions granted by this role.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Grant a permission. Permissions with the same canonical form are kept once.
    pub fn add_permission(&mut self, permission: Permission) {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
    }

    /// Parse and grant a permission string.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::PermissionError`] if the string is malformed.
    pub fn add_permission_str(&mut self, permission: &str) -> PermissionResult<()> {
        self.add_permission(Permission::parse(permission)?);
        Ok(())
    }

    /// Builder form of [`Self::add_permission`].
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.add_permission(permission);
        self
    }

    /// Whether any permission of this role implies `permission`.
    #[must_use]
    pub fn is_permitted(&self, permission: &Permission) -> bool {
        self.permissions.iter().any(|p| p.implies(permission))
    }
}

impl fmt::Display for SimpleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
