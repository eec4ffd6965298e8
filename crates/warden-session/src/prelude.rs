//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_session::prelude::*;` to import all essential types.

// Errors
pub use crate::{SessionError, SessionResult};

// Contracts
pub use crate::{Session, SessionContext, SessionKey, SessionManager};

// In-memory backend
pub use crate::{MemorySession, MemorySessionManager};
