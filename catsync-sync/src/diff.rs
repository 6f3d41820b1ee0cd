//! Key matcher and differ.
//!
//! Source drafts are matched to target categories strictly by key. A match
//! is diffed field by field into an ordered change-set; no match means the
//! draft is created.

use crate::fetch::FetchedCatalog;
use crate::lookup::KeyLookup;
use catsync_types::{Category, CategoryDraft, Key, UpdateAction};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Every keyed category of the target project, read-only once built.
#[derive(Debug, Clone, Default)]
pub struct TargetIndex {
    by_key: HashMap<Key, Category>,
    lookup: KeyLookup,
}

impl TargetIndex {
    /// Indexes a full target listing. Categories without a key can never
    /// match a draft and are left out.
    pub fn build(catalog: FetchedCatalog) -> Self {
        let total = catalog.categories.len();
        let index = Self {
            by_key: index_by_key(catalog.categories),
            lookup: catalog.lookup,
        };
        if index.len() < total {
            debug!(
                "Skipped {} target categories without a key",
                total - index.len()
            );
        }
        index
    }

    pub fn from_categories(categories: Vec<Category>) -> Self {
        let lookup = KeyLookup::from_categories(&categories);
        Self {
            by_key: index_by_key(categories),
            lookup,
        }
    }

    pub fn get(&self, key: &Key) -> Option<&Category> {
        self.by_key.get(key)
    }

    /// Keys of target resources referenced by the indexed categories.
    pub fn lookup(&self) -> &KeyLookup {
        &self.lookup
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

fn index_by_key(categories: Vec<Category>) -> HashMap<Key, Category> {
    categories
        .into_iter()
        .filter_map(|c| c.key.clone().map(|key| (key, c)))
        .collect()
}

/// The target category a draft corresponds to, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchResult<'a> {
    None,
    Found(&'a Category),
}

impl<'a> MatchResult<'a> {
    pub fn existing(self) -> Option<&'a Category> {
        match self {
            MatchResult::Found(category) => Some(category),
            MatchResult::None => None,
        }
    }
}

/// Finds the target category with the draft's key.
pub fn match_draft<'a>(draft: &CategoryDraft, index: &'a TargetIndex) -> MatchResult<'a> {
    match index.get(&draft.key) {
        Some(category) => MatchResult::Found(category),
        None => MatchResult::None,
    }
}

/// Computes the ordered change-set that turns `existing` into `draft`.
///
/// The parent change comes first, then scalar fields, then custom type and
/// field actions. `lookup` resolves the keys behind the existing category's
/// references when they were not expanded.
pub fn diff(draft: &CategoryDraft, existing: &Category, lookup: &KeyLookup) -> Vec<UpdateAction> {
    let mut actions = Vec::new();

    // None: root; Some(None): a parent whose key is unknown.
    let current_parent = existing.parent.as_ref().map(|p| lookup.resolve(p));
    let parent_changed = match (draft.parent_key(), current_parent) {
        (None, None) => false,
        (Some(wanted), Some(Some(current))) => wanted != current,
        _ => true,
    };
    if parent_changed {
        actions.push(UpdateAction::ChangeParent {
            parent: draft.parent.clone(),
        });
    }

    if draft.name != existing.name {
        actions.push(UpdateAction::ChangeName {
            name: draft.name.clone(),
        });
    }
    if draft.slug != existing.slug {
        actions.push(UpdateAction::ChangeSlug {
            slug: draft.slug.clone(),
        });
    }
    if draft.description != existing.description {
        actions.push(UpdateAction::SetDescription {
            description: draft.description.clone(),
        });
    }
    if draft.order_hint != existing.order_hint {
        actions.push(UpdateAction::ChangeOrderHint {
            order_hint: draft.order_hint.clone(),
        });
    }
    if draft.external_id != existing.external_id {
        actions.push(UpdateAction::SetExternalId {
            external_id: draft.external_id.clone(),
        });
    }
    if draft.meta_title != existing.meta_title {
        actions.push(UpdateAction::SetMetaTitle {
            meta_title: draft.meta_title.clone(),
        });
    }
    if draft.meta_description != existing.meta_description {
        actions.push(UpdateAction::SetMetaDescription {
            meta_description: draft.meta_description.clone(),
        });
    }
    if draft.meta_keywords != existing.meta_keywords {
        actions.push(UpdateAction::SetMetaKeywords {
            meta_keywords: draft.meta_keywords.clone(),
        });
    }

    diff_custom(draft, existing, lookup, &mut actions);
    actions
}

fn diff_custom(
    draft: &CategoryDraft,
    existing: &Category,
    lookup: &KeyLookup,
    actions: &mut Vec<UpdateAction>,
) {
    match (&draft.custom, &existing.custom) {
        (None, None) => {}
        (None, Some(_)) => actions.push(UpdateAction::SetCustomType {
            type_id: None,
            fields: None,
        }),
        (Some(wanted), current) => {
            let current = current.as_ref();
            let same_type = current
                .and_then(|c| lookup.resolve(&c.type_ref))
                .is_some_and(|key| key == wanted.type_key());
            let Some(current) = current.filter(|_| same_type) else {
                actions.push(UpdateAction::SetCustomType {
                    type_id: Some(wanted.type_id.clone()),
                    fields: Some(wanted.fields.clone()),
                });
                return;
            };

            let names: BTreeSet<&String> =
                wanted.fields.keys().chain(current.fields.keys()).collect();
            for name in names {
                match (wanted.fields.get(name), current.fields.get(name)) {
                    (Some(value), Some(old)) if value == old => {}
                    (Some(value), _) => actions.push(UpdateAction::SetCustomField {
                        name: name.clone(),
                        value: Some(value.clone()),
                    }),
                    (None, Some(_)) => actions.push(UpdateAction::SetCustomField {
                        name: name.clone(),
                        value: None,
                    }),
                    (None, None) => {}
                }
            }
        }
    }
}

/// What to do with a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Create,
    /// Apply `actions` to the category currently at `version`.
    Update {
        version: u64,
        actions: Vec<UpdateAction>,
    },
    NoOp,
}

impl SyncAction {
    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::Create => "create",
            SyncAction::Update { .. } => "update",
            SyncAction::NoOp => "no-op",
        }
    }
}

/// Decides between create, update and no-op for a draft.
pub fn decide(draft: &CategoryDraft, existing: Option<&Category>, lookup: &KeyLookup) -> SyncAction {
    let Some(existing) = existing else {
        return SyncAction::Create;
    };
    let actions = diff(draft, existing, lookup);
    if actions.is_empty() {
        SyncAction::NoOp
    } else {
        SyncAction::Update {
            version: existing.version,
            actions,
        }
    }
}
