//! Warden Realm - Identity sources.
//!
//! A realm answers two questions: "is this token a valid login?" (by returning
//! the stored [`AuthenticationInfo`](warden_authc::AuthenticationInfo) for the
//! claimed principal) and "what may these principals do?" (by returning
//! [`AuthorizationInfo`](warden_authz::AuthorizationInfo)).
//!
//! This crate provides:
//! - The [`Realm`], [`AuthorizingRealm`] and [`CacheAware`] traits
//! - [`SimpleAccountRealm`], an in-memory user/role database
//! - [`IniRealm`], the same database loaded from `[users]` / `[roles]` text
//! - [`CachingRealm`], a decorator memoizing lookups of another realm
//!
//! # Example
//!
//! ```
//! use warden_realm::{IniRealm, Realm};
//! use warden_authc::{AuthenticationInfo, UsernamePasswordToken};
//!
//! let realm = IniRealm::parse("users", "[users]\nfoo = password, manager\n[roles]\nmanager = write:*\n").unwrap();
//! let info = realm.authentication_info(&UsernamePasswordToken::new("foo", "password")).unwrap();
//! assert_eq!(info.principals()[0].to_string(), "foo");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod caching;
mod error;
mod ini;
mod realm;
mod simple;

pub use caching::{
    CachedInfo, CachingRealm, DEFAULT_AUTHENTICATION_TTL, DEFAULT_AUTHORIZATION_TTL,
};
pub use error::{RealmError, RealmResult};
pub use ini::IniRealm;
pub use realm::{AuthorizingRealm, CacheAware, Realm};
pub use simple::SimpleAccountRealm;
