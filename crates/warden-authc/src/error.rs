//! Authentication primitive errors.

use thiserror::Error;

/// Errors raised while configuring authentication primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthcError {
    /// The digest algorithm name is not one of the supported families.
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Result type for authentication primitive operations.
pub type AuthcResult<T> = Result<T, AuthcError>;
