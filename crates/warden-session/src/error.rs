//! Session error types.

use thiserror::Error;

/// Errors raised by sessions and session managers.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No session exists for the key.
    #[error("session not found: {id}")]
    NotFound {
        /// The session id.
        id: String,
    },

    /// The session has been invalidated or has expired.
    #[error("session is no longer valid: {id}")]
    Invalid {
        /// The session id.
        id: String,
    },

    /// The random source failed while generating a session id.
    #[error("failed to generate session id: {0}")]
    Entropy(String),

    /// A session attribute could not be encoded or decoded.
    #[error("session attribute codec error: {0}")]
    Codec(String),

    /// The session backend failed to persist or load.
    #[error("session storage error: {0}")]
    Storage(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
