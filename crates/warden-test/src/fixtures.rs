//! Test fixtures for common setups.

use std::sync::{Arc, Once};

use warden::SecurityManager;
use warden_authc::UsernamePasswordToken;
use warden_realm::IniRealm;
use warden_session::{DEFAULT_SESSION_TTL, MemorySessionManager};

/// Users and roles of the primary test realm.
///
/// `foo` is a manager (`write:*`), `bar` a guest (`read:public`), `baz` has
/// no role, and `admin` belongs to `agroup`, which holds every permission.
pub const USERS_INI: &str = "\
[users]
foo = password, manager
bar = password2, guest
baz = password3
admin = secret, agroup

[roles]
manager = write:*
guest = read:public
agroup = *
";

/// A second realm whose only user is unknown to [`USERS_INI`].
pub const OTHER_USERS_INI: &str = "\
[users]
qux = password, reader

[roles]
reader = read:*
";

/// Build an INI realm named `name` from `text`.
///
/// # Panics
///
/// Panics if the text is not a valid realm definition.
#[must_use]
pub fn test_ini_realm(name: &str, text: &str) -> Arc<IniRealm> {
    Arc::new(IniRealm::parse(name, text).expect("fixture realm parses"))
}

/// A username/password token.
#[must_use]
pub fn test_token(username: &str, password: &str) -> UsernamePasswordToken {
    UsernamePasswordToken::new(username, password)
}

/// A manager backed by a [`USERS_INI`] realm named `users`, without sessions.
#[must_use]
pub fn test_security_manager() -> Arc<SecurityManager> {
    SecurityManager::builder()
        .realm(test_ini_realm("users", USERS_INI))
        .build()
}

/// A manager backed by a [`USERS_INI`] realm and an in-memory session
/// manager with no background reaper.
#[must_use]
pub fn test_security_manager_with_sessions() -> Arc<SecurityManager> {
    SecurityManager::builder()
        .realm(test_ini_realm("users", USERS_INI))
        .session_manager(Arc::new(MemorySessionManager::with_settings(
            DEFAULT_SESSION_TTL,
            None,
        )))
        .build()
}

/// Route `tracing` output to the test harness, filtered by `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
