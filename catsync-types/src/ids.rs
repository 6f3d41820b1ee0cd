//! Identifier types for catalog resources.
//!
//! A [`ResourceId`] is assigned by the catalog system that stores a resource.
//! It is only meaningful inside that one project and must never leave it.
//! The portable identifier is the user-assigned [`Key`].

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// System-assigned identifier of a resource inside one catalog project.
///
/// Listings are sorted by id, so the id of the last result on a page is the
/// cursor for the next page. Locally generated ids are UUID v7 and keep that
/// order by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Uuid);

impl ResourceId {
    /// Assigns an id to a resource created in a local catalog.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// The continuation cursor for a page ending at this resource.
    pub fn cursor(&self) -> String {
        self.0.to_string()
    }

    /// Reads back a cursor produced by [`ResourceId::cursor`].
    pub fn from_cursor(cursor: &str) -> Result<Self, Error> {
        cursor.parse()
    }

    /// Query predicate selecting the resources listed after this one.
    pub fn after_predicate(&self) -> String {
        format!("id > \"{}\"", self.0)
    }
}

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ResourceId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// User-defined, project-unique key of a resource.
///
/// Keys are the only identifiers that are safe to carry from one project to
/// another. Any non-empty string is accepted; the catalog that stores the
/// resource owns any stricter format rules.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key(String);

impl Key {
    /// Wraps a key, rejecting the empty string.
    pub fn new(key: impl Into<String>) -> Result<Self, Error> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidKey("key must not be empty".to_string()));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Key {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
