//! The session contract.

use std::fmt;
use std::time::Instant;

use warden_core::Carrier;

use crate::SessionResult;

/// Per-identity state kept across interactions.
///
/// Attributes are opaque byte values; callers choose the encoding. Changes
/// become durable when [`Session::save`] is called.
pub trait Session: Send + Sync + fmt::Debug {
    /// The session id.
    fn id(&self) -> &str;

    /// Whether the session has not been invalidated.
    fn is_valid(&self) -> bool;

    /// When the session expires.
    fn expires_at(&self) -> Instant;

    /// Whether the expiry has passed.
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at()
    }

    /// Read an attribute.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Write an attribute.
    fn set(&self, key: &str, value: Vec<u8>);

    /// Remove an attribute.
    fn remove(&self, key: &str);

    /// Persist pending attribute changes.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::SessionError`] if the session is no longer valid
    /// or the backend fails to persist.
    fn save(&self) -> SessionResult<()>;

    /// The transport carrier the session was started with, if any.
    fn carrier(&self) -> Option<&Carrier> {
        None
    }
}
