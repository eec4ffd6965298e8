//! Configuration types.
//!
//! These types have no dependencies on other warden crates; conversion into
//! realms, caches and managers happens at the integration boundary. Every
//! struct implements [`Default`] so that a bare `[section]` header produces a
//! working configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Authentication policy.
    pub security: SecuritySection,
    /// Realm lookup caching.
    pub cache: CacheSection,
    /// Session management.
    pub sessions: SessionsSection,
    /// Identity sources, consulted in order.
    pub realms: Vec<RealmSection>,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// SecuritySection
// ---------------------------------------------------------------------------

/// How results from several realms combine into one login.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// At least one realm must authenticate the token.
    #[default]
    AtLeastOne,
    /// Every realm must support and authenticate the token.
    All,
}

/// Authentication policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecuritySection {
    /// The authentication strategy.
    pub strategy: StrategyKind,
}

// ---------------------------------------------------------------------------
// CacheSection
// ---------------------------------------------------------------------------

/// Caching of realm lookups.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Whether realms marked `cached` are wrapped in a caching decorator.
    pub enabled: bool,
    /// Max age applied to entries stored without one.
    pub default_max_age_secs: u64,
    /// Interval of the background sweep.
    pub sweep_interval_secs: u64,
    /// How long authentication lookups stay cached.
    pub authentication_ttl_secs: u64,
    /// How long authorization lookups stay cached.
    pub authorization_ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            default_max_age_secs: 3_600,
            sweep_interval_secs: 60,
            authentication_ttl_secs: 60,
            authorization_ttl_secs: 60,
        }
    }
}

impl CacheSection {
    /// Default entry max age.
    #[must_use]
    pub fn default_max_age(&self) -> Duration {
        Duration::from_secs(self.default_max_age_secs)
    }

    /// Sweep interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Authentication lookup TTL.
    #[must_use]
    pub fn authentication_ttl(&self) -> Duration {
        Duration::from_secs(self.authentication_ttl_secs)
    }

    /// Authorization lookup TTL.
    #[must_use]
    pub fn authorization_ttl(&self) -> Duration {
        Duration::from_secs(self.authorization_ttl_secs)
    }
}

// ---------------------------------------------------------------------------
// SessionsSection
// ---------------------------------------------------------------------------

/// Session management.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsSection {
    /// Whether the security manager gets an in-memory session manager.
    pub enabled: bool,
    /// Lifetime of sessions started without an explicit TTL.
    pub default_ttl_secs: u64,
    /// Interval of the expired-session reaper.
    pub reap_interval_secs: u64,
}

impl Default for SessionsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl_secs: 1_800,
            reap_interval_secs: 5,
        }
    }
}

impl SessionsSection {
    /// Default session lifetime.
    #[must_use]
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    /// Reaper interval.
    #[must_use]
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}

// ---------------------------------------------------------------------------
// RealmSection
// ---------------------------------------------------------------------------

/// The backing format of a realm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealmKind {
    /// `[users]` / `[roles]` text.
    #[default]
    Ini,
}

/// One identity source.
///
/// Exactly one of `path` and `content` must be set.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RealmSection {
    /// Realm name, unique across the configuration.
    pub name: String,
    /// Backing format.
    pub kind: RealmKind,
    /// File holding the realm data. Relative paths resolve against the
    /// directory of the configuration file that was loaded explicitly.
    pub path: Option<PathBuf>,
    /// Inline realm data.
    #[serde(skip_serializing)]
    pub content: Option<String>,
    /// Wrap the realm in a caching decorator (when `[cache] enabled`).
    pub cached: bool,
    /// How submitted credentials are checked.
    pub credentials: CredentialsSection,
}

impl std::fmt::Debug for RealmSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmSection")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("has_content", &self.content.is_some())
            .field("cached", &self.cached)
            .field("credentials", &self.credentials)
            .finish()
    }
}

/// Credentials comparison method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    /// Compare the submitted password with the stored one.
    #[default]
    Plain,
    /// Compare a salted, iterated digest of the submitted password.
    Hashed,
}

/// Credentials matcher settings for a realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    /// Comparison method.
    pub matcher: MatcherKind,
    /// Digest algorithm for `hashed` (`sha1`, `sha256`, `sha384`, `sha512`).
    pub algorithm: String,
    /// Digest iterations for `hashed`.
    pub iterations: u32,
    /// Whether stored digests are hex-encoded text.
    pub hex_encoded: bool,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            matcher: MatcherKind::Plain,
            algorithm: "sha256".to_owned(),
            iterations: 1,
            hex_encoded: true,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["warden_realm=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_sections_use_defaults() {
        let config: Config = toml::from_str("[cache]\n[sessions]\n").unwrap();
        assert!(config.cache.enabled);
        assert_eq!(config.cache.authentication_ttl(), Duration::from_secs(60));
        assert_eq!(config.sessions.default_ttl(), Duration::from_secs(1_800));
        assert_eq!(config.security.strategy, StrategyKind::AtLeastOne);
        assert!(config.realms.is_empty());
    }

    #[test]
    fn test_realm_section() {
        let config: Config = toml::from_str(
            r#"
            [security]
            strategy = "all"

            [[realms]]
            name = "users"
            content = "[users]\nfoo = password\n"
            cached = true
            [realms.credentials]
            matcher = "hashed"
            algorithm = "sha512"
            iterations = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.security.strategy, StrategyKind::All);
        let realm = &config.realms[0];
        assert_eq!(realm.kind, RealmKind::Ini);
        assert!(realm.cached);
        assert_eq!(realm.credentials.matcher, MatcherKind::Hashed);
        assert_eq!(realm.credentials.iterations, 3);
        assert!(realm.credentials.hex_encoded);
    }

    #[test]
    fn test_realm_debug_hides_content() {
        let realm = RealmSection {
            content: Some("foo = secret".to_owned()),
            ..RealmSection::default()
        };
        assert!(!format!("{realm:?}").contains("secret"));
    }
}
