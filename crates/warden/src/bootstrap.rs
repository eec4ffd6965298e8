//! Building a [`SecurityManager`] from configuration.

use std::sync::Arc;

use tracing::{debug, info};
use warden_authc::{CredentialsMatcher, HashedMatcher, PlainTextMatcher, StoredEncoding};
use warden_cache::MemoryCache;
use warden_config::{
    Config, CredentialsSection, MatcherKind, RealmKind, RealmSection, StrategyKind,
};
use warden_realm::{AuthorizingRealm, CachedInfo, CachingRealm, IniRealm, Realm};
use warden_session::MemorySessionManager;

use crate::{
    AllSuccessfulStrategy, AtLeastOneSuccessfulStrategy, AuthenticationStrategy, SecurityError,
    SecurityManager, SecurityResult,
};

/// Build a manager with the realms, caching, strategy and session manager
/// described by `config`.
///
/// Realms are added in configuration order. A realm marked `cached` is
/// wrapped in a [`CachingRealm`] only when `[cache] enabled` is set.
///
/// # Errors
///
/// Returns [`SecurityError::Configuration`] if the configuration describes no
/// realm, or [`SecurityError::Realm`] if a realm source cannot be loaded.
pub fn security_manager_from_config(config: &Config) -> SecurityResult<Arc<SecurityManager>> {
    if config.realms.is_empty() {
        return Err(SecurityError::Configuration(
            "configuration defines no realms".to_owned(),
        ));
    }

    let mut builder = SecurityManager::builder().strategy(strategy(config.security.strategy));

    for section in &config.realms {
        builder = builder.realm(build_realm(config, section)?);
    }

    if config.sessions.enabled {
        let sessions = MemorySessionManager::with_settings(
            config.sessions.default_ttl(),
            Some(config.sessions.reap_interval()),
        );
        builder = builder.session_manager(Arc::new(sessions));
    }

    let manager = builder.build();
    info!(
        realms = config.realms.len(),
        strategy = ?config.security.strategy,
        sessions = config.sessions.enabled,
        "Security manager configured"
    );
    Ok(manager)
}

fn strategy(kind: StrategyKind) -> Arc<dyn AuthenticationStrategy> {
    match kind {
        StrategyKind::AtLeastOne => Arc::new(AtLeastOneSuccessfulStrategy),
        StrategyKind::All => Arc::new(AllSuccessfulStrategy),
    }
}

fn matcher(credentials: &CredentialsSection) -> Arc<dyn CredentialsMatcher> {
    match credentials.matcher {
        MatcherKind::Plain => Arc::new(PlainTextMatcher),
        MatcherKind::Hashed => {
            let encoding = if credentials.hex_encoded {
                StoredEncoding::Hex
            } else {
                StoredEncoding::Raw
            };
            let algorithm = credentials.algorithm.to_ascii_lowercase();
            Arc::new(HashedMatcher::new(&algorithm, credentials.iterations).with_encoding(encoding))
        },
    }
}

fn build_realm(config: &Config, section: &RealmSection) -> SecurityResult<Arc<dyn Realm>> {
    let realm: Arc<dyn AuthorizingRealm> = match section.kind {
        RealmKind::Ini => {
            let realm = match (&section.path, &section.content) {
                (Some(path), _) => IniRealm::load(section.name.clone(), path)?,
                (None, Some(content)) => IniRealm::parse(section.name.clone(), content)?,
                (None, None) => {
                    return Err(SecurityError::Configuration(format!(
                        "realm '{}' has neither path nor content",
                        section.name
                    )));
                },
            };
            Arc::new(realm.with_credentials_matcher(matcher(&section.credentials)))
        },
    };

    if section.cached && config.cache.enabled {
        let cache = MemoryCache::<CachedInfo>::with_settings(
            config.cache.default_max_age(),
            Some(config.cache.sweep_interval()),
        );
        let caching = CachingRealm::new(realm, Arc::new(cache))
            .with_authentication_ttl(config.cache.authentication_ttl())
            .with_authorization_ttl(config.cache.authorization_ttl());
        debug!(realm = %section.name, "Realm wrapped in cache");
        return Ok(Arc::new(caching));
    }

    Ok(realm)
}
