//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_authz::prelude::*;` to import all essential types.

// Errors
pub use crate::{PermissionError, PermissionResult};

// Permissions
pub use crate::{Permission, WildcardPermission};

// Roles and authorization data
pub use crate::{AuthorizationInfo, Authorizer, SimpleAuthorizationInfo, SimpleRole};
