//! Realm error types.

use std::path::PathBuf;

use thiserror::Error;
use warden_authz::PermissionError;

/// Errors raised by realm lookups and realm construction.
#[derive(Debug, Error)]
pub enum RealmError {
    /// No account exists for the principal.
    #[error("unknown account: {principal}")]
    UnknownAccount {
        /// The principal that was looked up.
        principal: String,
    },

    /// An authorization lookup was made with an empty principal list.
    #[error("no principals supplied")]
    NoPrincipals,

    /// The backing store failed.
    #[error("realm backend error: {0}")]
    Backend(String),

    /// A line of realm text could not be parsed.
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A user entry has no password field.
    #[error("user '{user}' has no password")]
    MissingPassword {
        /// The user name.
        user: String,
    },

    /// A role entry lists no permissions.
    #[error("role '{role}' has no permissions")]
    EmptyRole {
        /// The role name.
        role: String,
    },

    /// A role entry lists a malformed permission.
    #[error("role '{role}' has an invalid permission: {source}")]
    InvalidPermission {
        /// The role name.
        role: String,
        /// The parse failure.
        #[source]
        source: PermissionError,
    },

    /// A realm file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl RealmError {
    /// Whether this error means the account does not exist.
    #[must_use]
    pub fn is_unknown_account(&self) -> bool {
        matches!(self, Self::UnknownAccount { .. })
    }
}

/// Result type for realm operations.
pub type RealmResult<T> = Result<T, RealmError>;
