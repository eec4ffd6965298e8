//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_authc::prelude::*;` to import all essential types.

// Errors
pub use crate::{AuthcError, AuthcResult};

// Tokens
pub use crate::{AuthenticationToken, TokenKind, UsernamePasswordToken};

// Accounts
pub use crate::{
    AuthenticationInfo, MergeableAuthenticationInfo, SimpleAccount, SimpleAuthenticationInfo,
};

// Matchers
pub use crate::{CredentialsMatcher, HashAlgorithm, HashedMatcher, PlainTextMatcher};
