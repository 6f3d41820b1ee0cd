//! Category update actions.
//!
//! Each action is one atomic field change. A change-set is an ordered
//! `Vec<UpdateAction>`; an empty change-set means nothing to do.

use crate::{LocalizedString, ResourceIdentifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One atomic category update, serialized with an `action` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum UpdateAction {
    /// Moves the category under another parent, or to the root when `None`.
    ChangeParent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<ResourceIdentifier>,
    },
    ChangeName {
        name: LocalizedString,
    },
    ChangeSlug {
        slug: LocalizedString,
    },
    SetDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    ChangeOrderHint {
        order_hint: String,
    },
    #[serde(rename_all = "camelCase")]
    SetExternalId {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        external_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaTitle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_title: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaDescription {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_description: Option<LocalizedString>,
    },
    #[serde(rename_all = "camelCase")]
    SetMetaKeywords {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        meta_keywords: Option<LocalizedString>,
    },
    /// Replaces the custom type and all custom fields at once.
    /// Without a type, removes custom fields from the category.
    SetCustomType {
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        type_id: Option<ResourceIdentifier>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fields: Option<BTreeMap<String, Value>>,
    },
    /// Sets one custom field; without a value, removes it.
    SetCustomField {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
}

impl UpdateAction {
    /// The wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            UpdateAction::ChangeParent { .. } => "changeParent",
            UpdateAction::ChangeName { .. } => "changeName",
            UpdateAction::ChangeSlug { .. } => "changeSlug",
            UpdateAction::SetDescription { .. } => "setDescription",
            UpdateAction::ChangeOrderHint { .. } => "changeOrderHint",
            UpdateAction::SetExternalId { .. } => "setExternalId",
            UpdateAction::SetMetaTitle { .. } => "setMetaTitle",
            UpdateAction::SetMetaDescription { .. } => "setMetaDescription",
            UpdateAction::SetMetaKeywords { .. } => "setMetaKeywords",
            UpdateAction::SetCustomType { .. } => "setCustomType",
            UpdateAction::SetCustomField { .. } => "setCustomField",
        }
    }

    pub fn is_parent_change(&self) -> bool {
        matches!(self, UpdateAction::ChangeParent { .. })
    }

    /// A `changeParent` without a parent: moves the category to the root.
    pub fn is_root_move(&self) -> bool {
        matches!(self, UpdateAction::ChangeParent { parent: None })
    }

    /// Whether the action touches custom type or custom fields.
    pub fn is_custom(&self) -> bool {
        matches!(
            self,
            UpdateAction::SetCustomType { .. } | UpdateAction::SetCustomField { .. }
        )
    }
}
