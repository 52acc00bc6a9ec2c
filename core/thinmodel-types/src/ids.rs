//! Identifier types used throughout thinmodel.
//!
//! Entity identities are assigned by adapters (or by the caller) and may be
//! numeric or textual. Kinds are identified by UUID v7 so that two kinds
//! sharing a name are still distinguishable in field type tags.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a persisted entity.
///
/// Numeric ids order before textual ids so mixed stores iterate
/// deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(u64),
    Text(String),
}

impl EntityId {
    /// Returns false for the "empty" identities `0` and `""`, which are
    /// never assigned.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0,
            Self::Text(s) => !s.is_empty(),
        }
    }

    /// Returns the numeric identity, if this is one.
    #[must_use]
    pub fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Returns the textual identity, if this is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Parses digits as a numeric identity, anything else as text.
impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<u64>()
            .map(Self::Number)
            .unwrap_or_else(|_| Self::Text(s.to_string())))
    }
}

/// Identity of one kind declaration.
///
/// Field type tags compare kinds by this id, not by name, so redeclaring
/// `Person` yields a kind whose entities the old `Person` fields reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(Uuid);

impl KindId {
    /// A fresh id, distinct from every other declaration.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for KindId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KindId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
