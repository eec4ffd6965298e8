//! Authorization query interface.

use warden_core::Principal;

use crate::Permission;

/// Answers role and permission questions for a set of principals.
///
/// Query methods never fail: lookup problems and malformed permission
/// strings evaluate to `false`.
pub trait Authorizer: Send + Sync {
    /// Whether the principals hold `role`.
    fn has_role(&self, principals: &[Principal], role: &str) -> bool;

    /// Whether the principals are granted `permission`.
    fn is_permitted(&self, principals: &[Principal], permission: &Permission) -> bool;

    /// Parse `permission` and check it. Unparseable strings are never permitted.
    fn is_permitted_str(&self, principals: &[Principal], permission: &str) -> bool {
        Permission::parse(permission).is_ok_and(|p| self.is_permitted(principals, &p))
    }
}
