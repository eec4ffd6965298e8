//! Warden Authz - Authorization primitives.
//!
//! This crate provides:
//! - [`Permission`] and [`WildcardPermission`], hierarchical wildcard
//!   permissions with an implication check
//! - [`AuthorizationInfo`], the roles and permissions granted to an identity
//! - [`SimpleRole`], a named bundle of permissions
//! - [`Authorizer`], the query interface used by realms and the security manager
//!
//! # Wildcard permissions
//!
//! A permission is a list of colon-separated parts, each part a set of
//! comma-separated tokens. `*` matches anything in its part.
//!
//! ```
//! use warden_authz::Permission;
//!
//! let granted: Permission = "printer:*:print".parse().unwrap();
//! assert!(granted.implies(&"printer:hp:print".parse().unwrap()));
//! assert!(!granted.implies(&"printer:hp:manage".parse().unwrap()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod authorizer;
mod error;
mod info;
mod permission;
mod role;

pub use authorizer::Authorizer;
pub use error::{PermissionError, PermissionResult};
pub use info::{AuthorizationInfo, SimpleAuthorizationInfo};
pub use permission::{
    Permission, WILDCARD_SEPARATOR, WILDCARD_SUB_SEPARATOR, WILDCARD_TOKEN, WildcardPermission,
};
pub use role::SimpleRole;
