//! Permission parsing errors.

use thiserror::Error;

/// Errors raised while constructing a permission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    /// The permission string was empty or whitespace.
    #[error("permission string must not be empty")]
    Empty,

    /// A part contained nothing but sub-separators or whitespace.
    #[error("permission '{permission}' has an empty part at index {index}")]
    EmptyPart {
        /// The rejected input.
        permission: String,
        /// Zero-based index of the empty part.
        index: usize,
    },
}

/// Result type for permission construction.
pub type PermissionResult<T> = Result<T, PermissionError>;
