//! Warden Test - Shared test utilities for the Warden crates.
//!
//! This crate provides instrumented realms and fixtures that can be used
//! across the warden crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! warden-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! #[test]
//! fn test_login() {
//!     let manager = warden_test::test_security_manager();
//!     let subject = manager.create_subject(Default::default()).unwrap();
//!     subject.login(&warden_test::test_token("foo", "password")).unwrap();
//!     assert!(subject.has_role("manager"));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
