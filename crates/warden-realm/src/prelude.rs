//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden_realm::prelude::*;` to import all essential types.

// Errors
pub use crate::{RealmError, RealmResult};

// Contracts
pub use crate::{AuthorizingRealm, CacheAware, Realm};

// Implementations
pub use crate::{CachingRealm, IniRealm, SimpleAccountRealm};
