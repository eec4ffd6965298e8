//! Security error types.

use thiserror::Error;
use warden_realm::RealmError;
use warden_session::SessionError;

/// Errors raised by the security manager, strategies and subjects.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// The security manager is not usable as configured.
    #[error("security manager misconfigured: {0}")]
    Configuration(String),

    /// No realm knows the claimed principal.
    #[error("unknown account: {principal}")]
    UnknownAccount {
        /// The claimed principal.
        principal: String,
    },

    /// An account was found but the credentials did not match.
    #[error("incorrect credentials")]
    IncorrectCredentials,

    /// A realm cannot handle the token and the strategy requires it to.
    #[error("realm '{realm}' does not support this token")]
    UnsupportedToken {
        /// The realm name.
        realm: String,
    },

    /// A realm returned no account and the strategy requires one.
    #[error("realm '{realm}' returned no account")]
    MissingAccount {
        /// The realm name.
        realm: String,
    },

    /// The aggregate already holds principals and cannot absorb another result.
    #[error("aggregate authentication info cannot be merged")]
    NotMergeable,

    /// No realm produced a principal.
    #[error("no realm authenticated the token")]
    NoRealmAuthenticated,

    /// The subject was created by a different security manager.
    #[error("subject was created by a different security manager")]
    ForeignSubject,

    /// The subject holds no principals.
    #[error("subject has no principals")]
    NoPrincipals,

    /// An empty principal set was supplied.
    #[error("principal set must not be empty")]
    EmptyPrincipalSet,

    /// The run-as stack is empty.
    #[error("run-as stack is empty")]
    EmptyStack,

    /// A realm failed.
    #[error(transparent)]
    Realm(RealmError),

    /// The session layer failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Persisted subject state could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(String),
}

impl SecurityError {
    /// Whether the error comes from configuration rather than the caller's credentials.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::ForeignSubject)
    }

    /// Whether the error is a rejected login.
    #[must_use]
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::UnknownAccount { .. }
                | Self::IncorrectCredentials
                | Self::UnsupportedToken { .. }
                | Self::MissingAccount { .. }
                | Self::NotMergeable
                | Self::NoRealmAuthenticated
                | Self::Realm(_)
        )
    }
}

impl From<RealmError> for SecurityError {
    fn from(error: RealmError) -> Self {
        match error {
            RealmError::UnknownAccount { principal } => Self::UnknownAccount { principal },
            other => Self::Realm(other),
        }
    }
}

/// The only failure a subject reports from `login`.
///
/// Unknown accounts and wrong credentials look the same from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginError {
    /// The security manager cannot authenticate anyone as configured.
    #[error("security system is misconfigured")]
    Misconfigured,

    /// The credentials were rejected.
    #[error("authentication failed")]
    AuthenticationFailed,
}

impl From<&SecurityError> for LoginError {
    fn from(error: &SecurityError) -> Self {
        if error.is_configuration() {
            Self::Misconfigured
        } else {
            Self::AuthenticationFailed
        }
    }
}

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_account_is_lifted() {
        let err = SecurityError::from(RealmError::UnknownAccount {
            principal: "foo".to_string(),
        });
        assert!(matches!(err, SecurityError::UnknownAccount { ref principal } if principal == "foo"));
        assert!(err.is_authentication_failure());

        let err = SecurityError::from(RealmError::Backend("down".to_string()));
        assert!(matches!(err, SecurityError::Realm(_)));
    }

    #[test]
    fn test_login_error_hides_cause() {
        let unknown = SecurityError::UnknownAccount {
            principal: "foo".to_string(),
        };
        assert_eq!(LoginError::from(&unknown), LoginError::AuthenticationFailed);
        assert_eq!(
            LoginError::from(&SecurityError::IncorrectCredentials),
            LoginError::AuthenticationFailed
        );
        assert_eq!(
            LoginError::from(&SecurityError::Configuration("no realms".to_string())),
            LoginError::Misconfigured
        );
        assert_eq!(LoginError::AuthenticationFailed.to_string(), "authentication failed");
    }
}
