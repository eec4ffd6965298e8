//! Authentication tokens submitted at login.

use std::fmt;

use warden_core::Principal;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The kind of an [`AuthenticationToken`], used by realms to declare support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A username and password pair.
    UsernamePassword,
    /// Any other token type, identified by name.
    Other(&'static str),
}

/// A principal and credentials pair submitted for authentication.
pub trait AuthenticationToken: Send + Sync + fmt::Debug {
    /// The identity being claimed.
    fn principal(&self) -> Principal;

    /// The credentials proving the claim, as raw bytes.
    fn credentials(&self) -> &[u8];

    /// The token kind.
    fn kind(&self) -> TokenKind;
}

/// A username/password token.
///
/// The username and password are zeroed by [`UsernamePasswordToken::clear`]
/// and again when the token is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct UsernamePasswordToken {
    username: String,
    password: Vec<u8>,
    remember_me: bool,
}

impl UsernamePasswordToken {
    /// Create a token.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl AsRef<[u8]>) -> Self {
        Self {
            username: username.into(),
            password: password.as_ref().to_vec(),
            remember_me: false,
        }
    }

    /// Ask the host to remember the identity across sessions.
    #[must_use]
    pub fn with_remember_me(mut self, remember_me: bool) -> Self {
        self.remember_me = remember_me;
        self
    }

    /// The submitted username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Whether remember-me was requested.
    #[must_use]
    pub fn remember_me(&self) -> bool {
        self.remember_me
    }

    /// Zero the username and password in place.
    pub fn clear(&mut self) {
        self.zeroize();
    }
}

impl AuthenticationToken for UsernamePasswordToken {
    fn principal(&self) -> Principal {
        Principal::Name(self.username.clone())
    }

    fn credentials(&self) -> &[u8] {
        &self.password
    }

    fn kind(&self) -> TokenKind {
        TokenKind::UsernamePassword
    }
}

impl fmt::Debug for UsernamePasswordToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsernamePasswordToken")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_accessors() {
        let token = UsernamePasswordToken::new("foo", "password").with_remember_me(true);
        assert_eq!(token.principal(), Principal::name("foo"));
        assert_eq!(token.credentials(), b"password");
        assert_eq!(token.kind(), TokenKind::UsernamePassword);
        assert!(token.remember_me());
    }

    #[test]
    fn test_clear_zeroes_secrets() {
        let mut token = UsernamePasswordToken::new("foo", "password").with_remember_me(true);
        token.clear();
        assert!(token.username().is_empty());
        assert!(token.credentials().is_empty());
        assert!(!token.remember_me());
    }

    #[test]
    fn test_debug_redacts_password() {
        let token = UsernamePasswordToken::new("foo", "hunter2");
        let debug = format!("{token:?}");
        assert!(debug.contains("foo"));
        assert!(!debug.contains("hunter2"));
    }
}
