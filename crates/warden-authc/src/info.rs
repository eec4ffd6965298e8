//! Authentication info returned by realms.

use std::fmt;

use warden_core::Principal;

/// What a realm knows about an identity for authentication purposes.
pub trait AuthenticationInfo: Send + Sync + fmt::Debug {
    /// Principals of the identity. The first one is the primary principal.
    fn principals(&self) -> &[Principal];

    /// Stored credentials, as raw bytes.
    fn credentials(&self) -> &[u8];

    /// Salt mixed into hashed credentials, if any.
    fn credentials_salt(&self) -> Option<&[u8]> {
        None
    }

    /// The merging capability, when this info can absorb other results.
    fn as_mergeable(&mut self) -> Option<&mut dyn MergeableAuthenticationInfo> {
        None
    }
}

/// An [`AuthenticationInfo`] that can absorb the results of other realms.
pub trait MergeableAuthenticationInfo: AuthenticationInfo {
    /// Merge `other` into `self`. Principals already present are skipped.
    fn merge(&mut self, other: &dyn AuthenticationInfo);
}

/// Append the principals of `from` that `into` does not hold yet.
pub(crate) fn merge_principals(into: &mut Vec<Principal>, from: &[Principal]) {
    for principal in from {
        if !into.contains(principal) {
            into.push(principal.clone());
        }
    }
}

/// Plain authentication info, also used as the strategy aggregate.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SimpleAuthenticationInfo {
    principals: Vec<Principal>,
    credentials: Vec<u8>,
    salt: Option<Vec<u8>>,
}

impl SimpleAuthenticationInfo {
    /// Create an empty info with no principals.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create an info holding a single principal.
    #[must_use]
    pub fn new(principal: impl Into<Principal>, credentials: Vec<u8>) -> Self {
        Self {
            principals: vec![principal.into()],
            credentials,
            salt: None,
        }
    }

    /// Attach a credentials salt.
    #[must_use]
    pub fn with_salt(mut self, salt: Vec<u8>) -> Self {
        self.salt = Some(salt);
        self
    }

    /// Whether no principal has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }
}

impl AuthenticationInfo for SimpleAuthenticationInfo {
    fn principals(&self) -> &[Principal] {
        &self.principals
    }

    fn credentials(&self) -> &[u8] {
        &self.credentials
    }

    fn credentials_salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    fn as_mergeable(&mut self) -> Option<&mut dyn MergeableAuthenticationInfo> {
        Some(self)
    }
}

impl MergeableAuthenticationInfo for SimpleAuthenticationInfo {
    fn merge(&mut self, other: &dyn AuthenticationInfo) {
        merge_principals(&mut self.principals, other.principals());

        if self.credentials.is_empty() {
            self.credentials = other.credentials().to_vec();
        }
        if self.salt.is_none() {
            self.salt = other.credentials_salt().map(<[u8]>::to_vec);
        }
    }
}

impl fmt::Debug for SimpleAuthenticationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleAuthenticationInfo")
            .field("principals", &self.principals)
            .field("credentials", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
