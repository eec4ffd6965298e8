//! Hierarchical wildcard permissions.
//!
//! A wildcard permission such as `printers:hp,canon:print` has ordered parts
//! separated by `:`, each part a set of tokens separated by `,`. Tokens are
//! case-folded to lower case. The token `*` in a part matches anything in
//! that part.
//!
//! Implication is directional: `printers` implies `printers:hp:print` (a
//! shorter permission covers all trailing parts), but `printers:hp:print`
//! does not imply `printers` unless its extra parts are all `*`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PermissionError, PermissionResult};

/// Separator between parts.
pub const WILDCARD_SEPARATOR: char = ':';
/// Separator between tokens within a part.
pub const WILDCARD_SUB_SEPARATOR: char = ',';
/// Token matching anything in its part.
pub const WILDCARD_TOKEN: &str = "*";

/// A parsed wildcard permission.
///
/// Never empty: construction rejects empty input, separator-only input and
/// parts without tokens. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WildcardPermission {
    parts: Vec<BTreeSet<String>>,
}

impl WildcardPermission {
    /// Parse a permission string.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::Empty`] for empty or whitespace-only input
    /// and [`PermissionError::EmptyPart`] when any part has no tokens (for
    /// example `":::"` or `"a:,,:b"`).
    pub fn new(permission: &str) -> PermissionResult<Self> {
        let trimmed = permission.trim();
        if trimmed.is_empty() {
            return Err(PermissionError::Empty);
        }

        let mut parts = Vec::new();
        for (index, raw) in trimmed.split(WILDCARD_SEPARATOR).enumerate() {
            let tokens: BTreeSet<String> = raw
                .split(WILDCARD_SUB_SEPARATOR)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_lowercase)
                .collect();

            if tokens.is_empty() {
                return Err(PermissionError::EmptyPart {
                    permission: trimmed.to_string(),
                    index,
                });
            }
            parts.push(tokens);
        }

        Ok(Self { parts })
    }

    /// The parsed parts, in order.
    #[must_use]
    pub fn parts(&self) -> &[BTreeSet<String>] {
        &self.parts
    }

    /// Whether holding this permission grants `other`.
    #[must_use]
    pub fn implies(&self, other: &Self) -> bool {
        for (i, other_part) in other.parts.iter().enumerate() {
            let Some(part) = self.parts.get(i) else {
                // Fewer parts: the rest of `other` is implied.
                return true;
            };
            if !part.contains(WILDCARD_TOKEN) && !part.is_superset(other_part) {
                return false;
            }
        }

        // Extra trailing parts must all be wildcards.
        self.parts
            .iter()
            .skip(other.parts.len())
            .all(|part| part.contains(WILDCARD_TOKEN))
    }
}

impl fmt::Display for WildcardPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                write!(f, "{WILDCARD_SEPARATOR}")?;
            }
            for (j, token) in part.iter().enumerate() {
                if j > 0 {
                    write!(f, "{WILDCARD_SUB_SEPARATOR}")?;
                }
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

impl FromStr for WildcardPermission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// A permission granted to a principal.
///
/// Serializes as its canonical string; `"*"` round-trips to [`Permission::All`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Implies every permission. Only implied by itself.
    All,
    /// A hierarchical wildcard permission.
    Wildcard(WildcardPermission),
}

impl Permission {
    /// Parse a permission string. The bare string `*` yields [`Permission::All`].
    ///
    /// # Errors
    ///
    /// Returns a [`PermissionError`] if the string is malformed.
    pub fn parse(permission: &str) -> PermissionResult<Self> {
        if permission.trim() == WILDCARD_TOKEN {
            return Ok(Self::All);
        }
        WildcardPermission::new(permission).map(Self::Wildcard)
    }

    /// Whether holding this permission grants `other`.
    #[must_use]
    pub fn implies(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::All, _) => true,
            (Self::Wildcard(_), Self::All) => false,
            (Self::Wildcard(this), Self::Wildcard(that)) => this.implies(that),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(WILDCARD_TOKEN),
            Self::Wildcard(w) => w.fmt(f),
        }
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<WildcardPermission> for Permission {
    fn from(w: WildcardPermission) -> Self {
        Self::Wildcard(w)
    }
}

impl Serialize for Permission {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
