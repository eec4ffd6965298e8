//! Caching decorator for realms.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use warden_authc::{AuthenticationInfo, AuthenticationToken, CredentialsMatcher};
use warden_authz::AuthorizationInfo;
use warden_cache::{Cache, CacheItem, MemoryCache};
use warden_core::Principal;

use crate::{AuthorizingRealm, CacheAware, Realm, RealmError, RealmResult};

/// Default time authentication lookups stay cached.
pub const DEFAULT_AUTHENTICATION_TTL: Duration = Duration::from_secs(60);

/// Default time authorization lookups stay cached.
pub const DEFAULT_AUTHORIZATION_TTL: Duration = Duration::from_secs(60);

const AUTHC_PREFIX: &str = "authc:";
const AUTHZ_PREFIX: &str = "authz:";

/// A value memoized by a [`CachingRealm`].
#[derive(Debug, Clone)]
pub enum CachedInfo {
    /// A successful authentication lookup.
    Authentication(Arc<dyn AuthenticationInfo>),
    /// A successful authorization lookup.
    Authorization(Arc<dyn AuthorizationInfo>),
    /// A lookup that found no account (only with negative caching enabled).
    UnknownAccount,
}

/// Memoizes the lookups of a backing [`AuthorizingRealm`].
///
/// Authentication info is keyed by the token's principal and authorization
/// info by the primary principal. Principals without a stable cache key
/// (structured principals) bypass the cache. Failed lookups are not cached
/// unless [`CachingRealm::with_negative_caching`] is enabled, and then only
/// unknown-account results are.
///
/// `supports` and the credentials matcher pass straight through.
/// Concurrent misses for the same principal may each reach the backing realm.
pub struct CachingRealm {
    name: String,
    inner: Arc<dyn AuthorizingRealm>,
    cache: Arc<dyn Cache<CachedInfo>>,
    authentication_ttl: Duration,
    authorization_ttl: Duration,
    negative_ttl: Option<Duration>,
}

impl CachingRealm {
    /// Wrap `inner`, storing entries in `cache`.
    #[must_use]
    pub fn new(inner: Arc<dyn AuthorizingRealm>, cache: Arc<dyn Cache<CachedInfo>>) -> Self {
        Self {
            name: format!("CachingRealm({})", inner.name()),
            inner,
            cache,
            authentication_ttl: DEFAULT_AUTHENTICATION_TTL,
            authorization_ttl: DEFAULT_AUTHORIZATION_TTL,
            negative_ttl: None,
        }
    }

    /// Wrap `inner` with a private [`MemoryCache`].
    #[must_use]
    pub fn with_memory_cache(inner: Arc<dyn AuthorizingRealm>) -> Self {
        Self::new(inner, Arc::new(MemoryCache::<CachedInfo>::new()))
    }

    /// Set how long authentication lookups stay cached.
    #[must_use]
    pub fn with_authentication_ttl(mut self, ttl: Duration) -> Self {
        self.authentication_ttl = ttl;
        self
    }

    /// Set how long authorization lookups stay cached.
    #[must_use]
    pub fn with_authorization_ttl(mut self, ttl: Duration) -> Self {
        self.authorization_ttl = ttl;
        self
    }

    /// Also cache unknown-account results for `ttl`.
    #[must_use]
    pub fn with_negative_caching(mut self, ttl: Duration) -> Self {
        self.negative_ttl = Some(ttl);
        self
    }

    /// The backing realm.
    #[must_use]
    pub fn inner(&self) -> &Arc<dyn AuthorizingRealm> {
        &self.inner
    }

    fn authc_key(principal: &Principal) -> Option<String> {
        principal.cache_key().map(|k| format!("{AUTHC_PREFIX}{k}"))
    }

    fn authz_key(principal: &Principal) -> Option<String> {
        principal.cache_key().map(|k| format!("{AUTHZ_PREFIX}{k}"))
    }
}

impl Realm for CachingRealm {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, token: &dyn AuthenticationToken) -> bool {
        self.inner.supports(token)
    }

    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>> {
        let principal = token.principal();
        let key = Self::authc_key(&principal);

        if let Some(key) = &key {
            match self.cache.get(key) {
                Some(CachedInfo::Authentication(info)) => {
                    tracing::trace!(realm = %self.name, %principal, "Authentication cache hit");
                    return Ok(info);
                },
                Some(CachedInfo::UnknownAccount) => {
                    tracing::trace!(realm = %self.name, %principal, "Negative cache hit");
                    return Err(RealmError::UnknownAccount {
                        principal: principal.to_string(),
                    });
                },
                Some(CachedInfo::Authorization(_)) | None => {},
            }
        }

        match self.inner.authentication_info(token) {
            Ok(info) => {
                if let Some(key) = &key {
                    self.cache.set(
                        key,
                        CacheItem::new(
                            CachedInfo::Authentication(Arc::clone(&info)),
                            self.authentication_ttl,
                        ),
                    );
                }
                Ok(info)
            },
            Err(e) => {
                if let (Some(key), Some(ttl), true) =
                    (&key, self.negative_ttl, e.is_unknown_account())
                {
                    self.cache
                        .set(key, CacheItem::new(CachedInfo::UnknownAccount, ttl));
                }
                Err(e)
            },
        }
    }

    fn credentials_matcher(&self) -> Option<&dyn CredentialsMatcher> {
        self.inner.credentials_matcher()
    }

    fn as_authorizing(&self) -> Option<&dyn AuthorizingRealm> {
        Some(self)
    }

    fn as_cache_aware(&self) -> Option<&dyn CacheAware> {
        Some(self)
    }
}

impl AuthorizingRealm for CachingRealm {
    fn authorization_info(
        &self,
        principals: &[Principal],
    ) -> RealmResult<Arc<dyn AuthorizationInfo>> {
        let key = principals.first().and_then(Self::authz_key);

        if let Some(key) = &key
            && let Some(CachedInfo::Authorization(info)) = self.cache.get(key)
        {
            tracing::trace!(realm = %self.name, "Authorization cache hit");
            return Ok(info);
        }

        let info = self.inner.authorization_info(principals)?;
        if let Some(key) = &key {
            self.cache.set(
                key,
                CacheItem::new(
                    CachedInfo::Authorization(Arc::clone(&info)),
                    self.authorization_ttl,
                ),
            );
        }
        Ok(info)
    }
}

impl CacheAware for CachingRealm {
    fn clear_cache(&self, principals: &[Principal]) {
        for principal in principals {
            if let Some(key) = Self::authc_key(principal) {
                self.cache.del(&key);
            }
            if let Some(key) = Self::authz_key(principal) {
                self.cache.del(&key);
            }
        }
        tracing::trace!(realm = %self.name, count = principals.len(), "Cleared cached lookups");
    }
}

impl fmt::Debug for CachingRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachingRealm")
            .field("inner", &self.inner)
            .field("authentication_ttl", &self.authentication_ttl)
            .field("authorization_ttl", &self.authorization_ttl)
            .field("negative_ttl", &self.negative_ttl)
            .finish_non_exhaustive()
    }
}
