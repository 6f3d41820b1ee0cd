//! Reference rewriter: turns fetched categories into portable drafts.
//!
//! Every id-based reference is replaced by the key of its target. A
//! category whose references cannot all be resolved, or whose parent chain
//! never reaches a root, is rejected instead of being synced with a
//! corrupted tree position.

use crate::error::ReferenceError;
use crate::lookup::KeyLookup;
use catsync_types::{Category, CategoryDraft, CustomFieldsDraft, ResourceId, ResourceIdentifier};
use std::collections::{HashMap, HashSet};

/// A draft ready to sync, with its depth in the category tree (root = 0).
#[derive(Debug, Clone, PartialEq)]
pub struct PortableDraft {
    pub draft: CategoryDraft,
    pub depth: usize,
}

/// A source category excluded from the sync.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedCategory {
    pub id: ResourceId,
    /// Key of the category, or `id:<id>` when it has none.
    pub label: String,
    pub error: ReferenceError,
}

/// Result of rewriting a full source listing.
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    /// Accepted drafts, in source order.
    pub drafts: Vec<PortableDraft>,
    pub rejected: Vec<RejectedCategory>,
}

/// Converts one fetched category into a draft whose references are all
/// expressed by key.
pub fn to_portable_draft(
    category: &Category,
    lookup: &KeyLookup,
) -> Result<CategoryDraft, ReferenceError> {
    let key = category
        .key
        .clone()
        .ok_or(ReferenceError::MissingKey { id: category.id })?;

    let parent = match &category.parent {
        Some(parent) if parent.id == category.id => {
            return Err(ReferenceError::Cycle {
                path: vec![key.to_string(), key.to_string()],
            });
        }
        Some(parent) => {
            let parent_key = lookup.resolve(parent).ok_or(ReferenceError::Dangling {
                type_id: parent.type_id,
                id: parent.id,
            })?;
            Some(ResourceIdentifier::category(parent_key.clone()))
        }
        None => None,
    };

    let custom = match &category.custom {
        Some(custom) => {
            let type_key =
                lookup
                    .resolve(&custom.type_ref)
                    .ok_or(ReferenceError::Dangling {
                        type_id: custom.type_ref.type_id,
                        id: custom.type_ref.id,
                    })?;
            Some(CustomFieldsDraft {
                type_id: ResourceIdentifier::custom_type(type_key.clone()),
                fields: custom.fields.clone(),
            })
        }
        None => None,
    };

    Ok(CategoryDraft {
        key,
        name: category.name.clone(),
        slug: category.slug.clone(),
        description: category.description.clone(),
        parent,
        order_hint: category.order_hint.clone(),
        external_id: category.external_id.clone(),
        meta_title: category.meta_title.clone(),
        meta_description: category.meta_description.clone(),
        meta_keywords: category.meta_keywords.clone(),
        custom,
    })
}

/// Position of a category in the parent forest.
#[derive(Debug, Clone)]
enum Ancestry {
    Depth(usize),
    /// The chain loops; holds the labels along the loop.
    Cyclic(Vec<String>),
}

/// How an upward walk from a category ended.
enum WalkEnd {
    /// The last category on the chain is a root.
    Root,
    /// The last category's parent is not part of the listing.
    Outside,
    /// The last category's parent has a known ancestry.
    Known(Ancestry),
    /// The chain revisited the category at this position.
    Loop(usize),
}

struct Forest<'a> {
    by_id: HashMap<ResourceId, &'a Category>,
    memo: HashMap<ResourceId, Ancestry>,
}

impl<'a> Forest<'a> {
    fn new(categories: &'a [Category]) -> Self {
        Self {
            by_id: categories.iter().map(|c| (c.id, c)).collect(),
            memo: HashMap::new(),
        }
    }

    fn label(&self, id: ResourceId) -> String {
        self.by_id
            .get(&id)
            .map(|c| c.label())
            .unwrap_or_else(|| format!("id:{id}"))
    }

    fn parent_of(&self, id: ResourceId) -> Option<ResourceId> {
        self.by_id
            .get(&id)
            .and_then(|c| c.parent.as_ref())
            .map(|p| p.id)
    }

    /// Walks up from `start` once, memoizing every category on the way so
    /// the whole listing is classified in linear time.
    fn ancestry(&mut self, start: ResourceId) -> Ancestry {
        if let Some(known) = self.memo.get(&start) {
            return known.clone();
        }

        let mut chain = Vec::new();
        let mut on_chain = HashSet::new();
        let mut current = start;
        let end = loop {
            chain.push(current);
            on_chain.insert(current);
            let Some(parent) = self.parent_of(current) else {
                break WalkEnd::Root;
            };
            if let Some(known) = self.memo.get(&parent) {
                break WalkEnd::Known(known.clone());
            }
            if on_chain.contains(&parent) {
                let pos = chain.iter().position(|id| *id == parent).unwrap_or(0);
                break WalkEnd::Loop(pos);
            }
            if !self.by_id.contains_key(&parent) {
                break WalkEnd::Outside;
            }
            current = parent;
        };

        // Depth of the topmost category on the chain, or the loop it hangs off.
        let top = match end {
            WalkEnd::Root => Ok(0),
            WalkEnd::Outside => Ok(1),
            WalkEnd::Known(Ancestry::Depth(parent_depth)) => Ok(parent_depth + 1),
            WalkEnd::Known(Ancestry::Cyclic(path)) => Err(path),
            WalkEnd::Loop(pos) => {
                let mut path: Vec<String> = chain[pos..].iter().map(|id| self.label(*id)).collect();
                path.push(self.label(chain[pos]));
                Err(path)
            }
        };

        match top {
            Ok(mut depth) => {
                for id in chain.iter().rev() {
                    self.memo.insert(*id, Ancestry::Depth(depth));
                    depth += 1;
                }
            }
            Err(path) => {
                for id in &chain {
                    self.memo.insert(*id, Ancestry::Cyclic(path.clone()));
                }
            }
        }

        self.memo
            .get(&start)
            .cloned()
            .unwrap_or(Ancestry::Depth(0))
    }
}

/// Rewrites a full source listing.
///
/// Categories are rejected when they have no key, hold a reference that
/// `lookup` cannot resolve, or sit on (or below) a circular parent chain.
pub fn rewrite_all(categories: &[Category], lookup: &KeyLookup) -> RewriteOutcome {
    let mut forest = Forest::new(categories);
    let mut outcome = RewriteOutcome::default();

    for category in categories {
        let rejected = |error| RejectedCategory {
            id: category.id,
            label: category.label(),
            error,
        };

        let draft = match to_portable_draft(category, lookup) {
            Ok(draft) => draft,
            Err(error) => {
                outcome.rejected.push(rejected(error));
                continue;
            }
        };

        match forest.ancestry(category.id) {
            Ancestry::Depth(depth) => outcome.drafts.push(PortableDraft { draft, depth }),
            Ancestry::Cyclic(path) => outcome
                .rejected
                .push(rejected(ReferenceError::Cycle { path })),
        }
    }

    outcome
}
