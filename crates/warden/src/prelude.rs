//! Prelude module - commonly used types for convenient import.
//!
//! Use `use warden::prelude::*;` to import all essential types.

// Errors
pub use crate::{LoginError, SecurityError, SecurityResult};

// Orchestration
pub use crate::{SecurityManager, SecurityManagerBuilder, security_manager_from_config};

// Strategies
pub use crate::{AllSuccessfulStrategy, AtLeastOneSuccessfulStrategy, AuthenticationStrategy};

// Subjects
pub use crate::{PrincipalStack, Subject, SubjectContext, SubjectRegistry};
