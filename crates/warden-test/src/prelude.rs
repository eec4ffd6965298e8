//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_test::prelude::*;` to import all essential types.

// Realms
pub use crate::{CountingRealm, UnsupportedRealm};

// Sessions
pub use crate::{DurableSession, DurableSessionManager};

// Fixtures
pub use crate::{
    OTHER_USERS_INI, USERS_INI, init_test_logging, test_ini_realm, test_security_manager,
    test_security_manager_with_sessions, test_token,
};
