//! Warden - Embeddable authentication, authorization and session core.
//!
//! This crate ties the lower layers together:
//! - [`SecurityManager`] consults an ordered list of realms through an
//!   [`AuthenticationStrategy`] and owns the optional session manager
//! - [`Subject`] is the per-interaction identity facade: login, logout, role
//!   and permission checks, and run-as identity assumption
//! - [`SubjectRegistry`] binds interaction keys to subjects
//! - [`security_manager_from_config`] builds a manager from a
//!   [`warden_config::Config`]
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use warden::{SecurityManager, SubjectContext};
//! use warden_authc::UsernamePasswordToken;
//! use warden_realm::IniRealm;
//!
//! let realm = IniRealm::parse(
//!     "users",
//!     "[users]\nfoo = password, manager\n[roles]\nmanager = write:*\n",
//! )
//! .unwrap();
//! let manager = SecurityManager::builder().realm(Arc::new(realm)).build();
//!
//! let subject = manager.create_subject(SubjectContext::new()).unwrap();
//! subject.login(&UsernamePasswordToken::new("foo", "password")).unwrap();
//! assert!(subject.is_permitted_str("write:anything"));
//! assert!(!subject.is_permitted_str("read:anything"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod bootstrap;
pub mod prelude;

mod context;
mod error;
mod manager;
mod registry;
mod run_as;
mod strategy;
mod subject;

pub use bootstrap::security_manager_from_config;
pub use context::SubjectContext;
pub use error::{LoginError, SecurityError, SecurityResult};
pub use manager::{SecurityManager, SecurityManagerBuilder};
pub use registry::SubjectRegistry;
pub use run_as::PrincipalStack;
pub use strategy::{
    Aggregate, AllSuccessfulStrategy, AtLeastOneSuccessfulStrategy, AuthenticationStrategy,
    merge_into,
};
pub use subject::{AUTHENTICATED_KEY, PRINCIPALS_KEY, RUN_AS_KEY, Subject};
