//! Principals - identifiers for an identity.
//!
//! A subject may hold several principals at once (for example a username and
//! an internal account UUID). The first principal in a list is the primary one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An identifier for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    /// A plain name, usually a username.
    Name(String),
    /// A UUID-based identifier.
    Id(Uuid),
    /// A structured identifier made of key/value attributes.
    ///
    /// Structured principals have no stable cache key; lookups keyed on them
    /// always bypass caches.
    Attributes(BTreeMap<String, String>),
}

impl Principal {
    /// Create a name principal.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    /// Create a structured principal from key/value pairs.
    #[must_use]
    pub fn attributes<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::Attributes(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// The name, if this is a name principal.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    /// A stable string key for this principal, if one can be derived.
    ///
    /// Name and UUID principals map to distinct prefixed keys so that a name
    /// which happens to look like a UUID never collides with a real UUID.
    #[must_use]
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Self::Name(name) => Some(format!("n:{name}")),
            Self::Id(id) => Some(format!("u:{id}")),
            Self::Attributes(_) => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Id(id) => write!(f, "{id}"),
            Self::Attributes(attrs) => {
                f.write_str("{")?;
                for (i, (k, v)) in attrs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                f.write_str("}")
            },
        }
    }
}

impl From<&str> for Principal {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for Principal {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Uuid> for Principal {
    fn from(id: Uuid) -> Self {
        Self::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_prefixed() {
        let id = Uuid::new_v4();
        assert_eq!(Principal::name("foo").cache_key().unwrap(), "n:foo");
        assert_eq!(
            Principal::from(id).cache_key().unwrap(),
            format!("u:{id}")
        );
        assert_ne!(
            Principal::name(id.to_string()).cache_key(),
            Principal::from(id).cache_key()
        );
    }

    #[test]
    fn test_structured_principal_has_no_cache_key() {
        let p = Principal::attributes([("tenant", "acme"), ("user", "foo")]);
        assert!(p.cache_key().is_none());
        assert_eq!(p.to_string(), "{tenant=acme, user=foo}");
    }

    #[test]
    fn test_display_and_conversions() {
        assert_eq!(Principal::from("bar").to_string(), "bar");
        assert_eq!(Principal::from("bar").as_name(), Some("bar"));
        assert!(Principal::from(Uuid::nil()).as_name().is_none());
    }

    #[test]
    fn test_serde() {
        let p = Principal::name("foo");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"name":"foo"}"#);
        let decoded: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, p);
    }
}
