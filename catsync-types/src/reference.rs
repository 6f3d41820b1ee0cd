//! References between catalog resources.
//!
//! A fetched resource points at other resources through a [`Reference`],
//! which carries the opaque id of the target (plus, when the query asked for
//! it, the expanded target object). Drafts sent to another project must use
//! a [`ResourceIdentifier`] instead, which names the target by key.

use crate::{Key, ResourceId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of resource a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceTypeId {
    Category,
    Type,
}

impl fmt::Display for ReferenceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceTypeId::Category => f.write_str("category"),
            ReferenceTypeId::Type => f.write_str("type"),
        }
    }
}

/// The part of an expanded referenced object the sync needs.
///
/// Unknown fields of the expanded object are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedResource {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
}

/// An id-based pointer to another resource in the same project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub type_id: ReferenceTypeId,
    pub id: ResourceId,
    /// The expanded target, present when the query requested the expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obj: Option<Box<ExpandedResource>>,
}

impl Reference {
    /// A bare (unexpanded) reference.
    pub fn new(type_id: ReferenceTypeId, id: ResourceId) -> Self {
        Self {
            type_id,
            id,
            obj: None,
        }
    }

    /// A category reference.
    pub fn category(id: ResourceId) -> Self {
        Self::new(ReferenceTypeId::Category, id)
    }

    /// A custom type reference.
    pub fn custom_type(id: ResourceId) -> Self {
        Self::new(ReferenceTypeId::Type, id)
    }

    /// Attaches an expanded object carrying the target's key.
    #[must_use]
    pub fn expanded(mut self, key: Option<Key>) -> Self {
        self.obj = Some(Box::new(ExpandedResource { id: self.id, key }));
        self
    }

    /// Whether the target object was expanded inline.
    pub fn is_expanded(&self) -> bool {
        self.obj.is_some()
    }

    /// The key of the target, if it was expanded and has one.
    pub fn expanded_key(&self) -> Option<&Key> {
        self.obj.as_ref().and_then(|obj| obj.key.as_ref())
    }
}

/// A key-based, portable pointer to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    pub type_id: ReferenceTypeId,
    pub key: Key,
}

impl ResourceIdentifier {
    pub fn new(type_id: ReferenceTypeId, key: Key) -> Self {
        Self { type_id, key }
    }

    pub fn category(key: Key) -> Self {
        Self::new(ReferenceTypeId::Category, key)
    }

    pub fn custom_type(key: Key) -> Self {
        Self::new(ReferenceTypeId::Type, key)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_id, self.key)
    }
}
