//! Warden Session - Tracking identities across interactions.
//!
//! This crate provides:
//! - [`Session`], the contract every session backend satisfies: an id, a
//!   validity flag, an expiry, byte-valued attributes and a save hook
//! - [`SessionManager`], which starts, fetches and invalidates sessions
//! - [`MemorySessionManager`], an in-process registry whose background
//!   reaper deletes expired sessions
//!
//! # Example
//!
//! ```
//! use warden_session::{MemorySessionManager, SessionContext, SessionKey, SessionManager};
//!
//! let manager = MemorySessionManager::new();
//! let session = manager.start(&SessionContext::default()).unwrap();
//! session.set("theme", b"dark".to_vec());
//!
//! let again = manager.get(&SessionKey::new(session.id())).unwrap();
//! assert_eq!(again.get("theme").as_deref(), Some(&b"dark"[..]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod manager;
mod memory;
mod session;

pub use error::{SessionError, SessionResult};
pub use manager::{SessionContext, SessionKey, SessionManager};
pub use memory::{
    DEFAULT_REAP_INTERVAL, DEFAULT_SESSION_TTL, MemorySession, MemorySessionManager,
    SESSION_ID_BYTES,
};
pub use session::Session;
