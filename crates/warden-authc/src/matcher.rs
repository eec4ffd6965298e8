//! Credentials matching.
//!
//! A [`CredentialsMatcher`] decides whether the credentials in a submitted
//! token match the stored credentials of an account. Comparisons are
//! constant time.

use std::fmt;
use std::str::FromStr;

use sha2::Digest;
use subtle::ConstantTimeEq;

use crate::error::AuthcError;
use crate::{AuthenticationInfo, AuthenticationToken};

/// Compares submitted credentials against stored ones.
pub trait CredentialsMatcher: Send + Sync + fmt::Debug {
    /// Whether the token's credentials match the info's stored credentials.
    fn matches(&self, token: &dyn AuthenticationToken, info: &dyn AuthenticationInfo) -> bool;
}

/// Byte-for-byte comparison of plaintext credentials.
///
/// Only suitable when the backing store keeps passwords in plaintext.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextMatcher;

impl CredentialsMatcher for PlainTextMatcher {
    fn matches(&self, token: &dyn AuthenticationToken, info: &dyn AuthenticationInfo) -> bool {
        bool::from(token.credentials().ct_eq(info.credentials()))
    }
}

/// Supported digest families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1. Only for legacy stores.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Look up an algorithm by name, case-insensitively (`sha1`, `sha256`,
    /// `sha384`, `sha512`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sha1" => Some(Self::Sha1),
            "sha256" => Some(Self::Sha256),
            "sha384" => Some(Self::Sha384),
            "sha512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// Canonical lower-case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = AuthcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| AuthcError::UnknownAlgorithm(s.to_string()))
    }
}

/// How hashed credentials are stored in an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoredEncoding {
    /// Raw digest bytes.
    #[default]
    Raw,
    /// Hex text of the digest.
    Hex,
}

/// Digest `credentials` with an optional salt, `iterations` times.
///
/// The salt is fed before the credentials in the first round; every further
/// round digests the previous digest. An iteration count of zero is treated
/// as one.
///
/// This is not compatible with stores that hash `salt` followed by the
/// credentials repeated `iterations` times in a single digest; with more than
/// one iteration such stored values never match.
#[must_use]
pub fn hash_credentials(
    algorithm: HashAlgorithm,
    salt: Option<&[u8]>,
    credentials: &[u8],
    iterations: u32,
) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha1 => iterate::<sha1::Sha1>(salt, credentials, iterations),
        HashAlgorithm::Sha256 => iterate::<sha2::Sha256>(salt, credentials, iterations),
        HashAlgorithm::Sha384 => iterate::<sha2::Sha384>(salt, credentials, iterations),
        HashAlgorithm::Sha512 => iterate::<sha2::Sha512>(salt, credentials, iterations),
    }
}

fn iterate<D: Digest>(salt: Option<&[u8]>, credentials: &[u8], iterations: u32) -> Vec<u8> {
    let mut hasher = D::new();
    if let Some(salt) = salt {
        hasher.update(salt);
    }
    hasher.update(credentials);
    let mut digest = hasher.finalize();

    for _ in 1..iterations.max(1) {
        digest = D::digest(&digest);
    }
    digest.to_vec()
}

/// Matches credentials stored as a salted, iterated digest.
///
/// The salt comes from [`AuthenticationInfo::credentials_salt`]. A matcher
/// built with an unknown algorithm name never matches.
#[derive(Debug, Clone)]
pub struct HashedMatcher {
    algorithm: Option<HashAlgorithm>,
    iterations: u32,
    encoding: StoredEncoding,
}

impl HashedMatcher {
    /// Create a matcher for a named algorithm.
    ///
    /// Unknown names produce a matcher that fails closed. Iterations are
    /// clamped to at least one.
    #[must_use]
    pub fn new(algorithm: &str, iterations: u32) -> Self {
        let resolved = HashAlgorithm::from_name(algorithm);
        if resolved.is_none() {
            tracing::warn!(
                algorithm,
                "Unknown hash algorithm, credentials will never match"
            );
        }
        Self {
            algorithm: resolved,
            iterations: iterations.max(1),
            encoding: StoredEncoding::Raw,
        }
    }

    /// Create a matcher for a known algorithm.
    #[must_use]
    pub fn with_algorithm(algorithm: HashAlgorithm, iterations: u32) -> Self {
        Self {
            algorithm: Some(algorithm),
            iterations: iterations.max(1),
            encoding: StoredEncoding::Raw,
        }
    }

    /// Set how stored credentials are encoded.
    #[must_use]
    pub fn with_encoding(mut self, encoding: StoredEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// The resolved algorithm, if the name was known.
    #[must_use]
    pub fn algorithm(&self) -> Option<HashAlgorithm> {
        self.algorithm
    }

    /// Effective iteration count.
    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }
}

impl CredentialsMatcher for HashedMatcher {
    fn matches(&self, token: &dyn AuthenticationToken, info: &dyn AuthenticationInfo) -> bool {
        let Some(algorithm) = self.algorithm else {
            return false;
        };

        let computed = hash_credentials(
            algorithm,
            info.credentials_salt(),
            token.credentials(),
            self.iterations,
        );

        match self.encoding {
            StoredEncoding::Raw => bool::from(computed.ct_eq(info.credentials())),
            StoredEncoding::Hex => match hex::decode(info.credentials()) {
                Ok(stored) => bool::from(computed.ct_eq(&stored)),
                Err(_) => false,
            },
        }
    }
}
