use crate::{Key, LocalizedString, Reference, ResourceId, ResourceIdentifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Custom fields of a fetched resource, scoped by a custom type reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFields {
    #[serde(rename = "type")]
    pub type_ref: Reference,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

/// Custom fields of a draft, with the custom type named by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFieldsDraft {
    #[serde(rename = "type")]
    pub type_id: ResourceIdentifier,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
}

impl CustomFieldsDraft {
    pub fn new(type_key: Key) -> Self {
        Self {
            type_id: ResourceIdentifier::custom_type(type_key),
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// The key of the custom type.
    pub fn type_key(&self) -> &Key {
        &self.type_id.key
    }
}

/// A category as stored in a catalog project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: ResourceId,
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Reference>,
    #[serde(default)]
    pub order_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl Category {
    /// Creates a version-1 category with a fresh id and no optional fields.
    pub fn new(key: Option<Key>, name: LocalizedString, slug: LocalizedString) -> Self {
        Self {
            id: ResourceId::new(),
            version: 1,
            key,
            name,
            slug,
            description: None,
            parent: None,
            order_hint: String::new(),
            external_id: None,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            custom: None,
            created_at: None,
            last_modified_at: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: Reference) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_custom(mut self, custom: CustomFields) -> Self {
        self.custom = Some(custom);
        self
    }

    /// A short label for logs: the key when present, else the id.
    pub fn label(&self) -> String {
        match &self.key {
            Some(key) => key.to_string(),
            None => format!("id:{}", self.id),
        }
    }
}

/// A portable, create/update-ready category.
///
/// Carries no system-assigned id and expresses every reference by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub key: Key,
    pub name: LocalizedString,
    pub slug: LocalizedString,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ResourceIdentifier>,
    #[serde(default)]
    pub order_hint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_keywords: Option<LocalizedString>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomFieldsDraft>,
}

impl CategoryDraft {
    /// Creates a root draft without optional fields.
    pub fn new(key: Key, name: LocalizedString, slug: LocalizedString) -> Self {
        Self {
            key,
            name,
            slug,
            description: None,
            parent: None,
            order_hint: String::new(),
            external_id: None,
            meta_title: None,
            meta_description: None,
            meta_keywords: None,
            custom: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_key: Key) -> Self {
        self.parent = Some(ResourceIdentifier::category(parent_key));
        self
    }

    #[must_use]
    pub fn with_custom(mut self, custom: CustomFieldsDraft) -> Self {
        self.custom = Some(custom);
        self
    }

    #[must_use]
    pub fn with_order_hint(mut self, order_hint: impl Into<String>) -> Self {
        self.order_hint = order_hint.into();
        self
    }

    /// The key of the parent category, if any.
    pub fn parent_key(&self) -> Option<&Key> {
        self.parent.as_ref().map(|p| &p.key)
    }
}
