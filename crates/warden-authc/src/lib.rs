//! Warden Authc - Authentication primitives.
//!
//! This crate provides:
//! - [`AuthenticationToken`] and [`UsernamePasswordToken`], the credentials a
//!   caller submits at login
//! - [`AuthenticationInfo`] and [`SimpleAccount`], what a realm knows about
//!   an identity
//! - [`CredentialsMatcher`] with [`PlainTextMatcher`] and [`HashedMatcher`]
//!
//! # Example
//!
//! ```
//! use warden_authc::{CredentialsMatcher, PlainTextMatcher, SimpleAccount, UsernamePasswordToken};
//!
//! let account = SimpleAccount::new("foo", b"password".to_vec(), "users");
//! let token = UsernamePasswordToken::new("foo", "password");
//! assert!(PlainTextMatcher.matches(&token, &account));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod account;
mod error;
mod info;
mod matcher;
mod token;

pub use account::SimpleAccount;
pub use error::{AuthcError, AuthcResult};
pub use info::{AuthenticationInfo, MergeableAuthenticationInfo, SimpleAuthenticationInfo};
pub use matcher::{
    CredentialsMatcher, HashAlgorithm, HashedMatcher, PlainTextMatcher, StoredEncoding,
    hash_credentials,
};
pub use token::{AuthenticationToken, TokenKind, UsernamePasswordToken};
