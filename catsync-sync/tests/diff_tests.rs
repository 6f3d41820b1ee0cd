//! Tests for diff.rs — key matching, change-sets and create/update/no-op.

mod common;

use catsync_sync::{
    KeyLookup, MatchResult, SyncAction, TargetIndex, decide, diff, match_draft,
};
use catsync_types::{
    Category, CategoryDraft, CustomFields, CustomFieldsDraft, LocalizedString, Reference,
    ResourceId, ResourceIdentifier, UpdateAction,
};
use common::{child, draft, key};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};

/// The target-side counterpart of `draft(k)`.
fn existing(k: &str) -> Category {
    let d = draft(k);
    Category::new(Some(d.key), d.name, d.slug)
}

fn existing_under(k: &str, parent: &str) -> Category {
    existing(k).with_parent(Reference::category(ResourceId::new()).expanded(Some(key(parent))))
}

fn custom(type_key: &str, fields: &[(&str, serde_json::Value)]) -> CustomFields {
    CustomFields {
        type_ref: Reference::custom_type(ResourceId::new()).expanded(Some(key(type_key))),
        fields: fields
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect(),
    }
}

fn custom_draft(type_key: &str, fields: &[(&str, serde_json::Value)]) -> CustomFieldsDraft {
    fields
        .iter()
        .fold(CustomFieldsDraft::new(key(type_key)), |d, (name, value)| {
            d.with_field(*name, value.clone())
        })
}

fn names(actions: &[UpdateAction]) -> Vec<&'static str> {
    actions.iter().map(UpdateAction::name).collect()
}

// ── Matching ────────────────────────────────────────────────────

#[test]
fn match_is_by_key() {
    let index = TargetIndex::from_categories(vec![existing("shoes"), existing("hats")]);

    match match_draft(&draft("shoes"), &index) {
        MatchResult::Found(category) => assert_eq!(category.key, Some(key("shoes"))),
        MatchResult::None => panic!("expected a match"),
    }
    assert_eq!(match_draft(&draft("socks"), &index), MatchResult::None);
}

#[test]
fn same_name_different_key_does_not_match() {
    let mut lookalike = existing("other-key");
    lookalike.name = LocalizedString::en("Category shoes");
    let index = TargetIndex::from_categories(vec![lookalike]);

    assert_eq!(match_draft(&draft("shoes"), &index).existing(), None);
}

#[test]
fn keyless_targets_are_not_indexed() {
    let keyless = Category::new(None, LocalizedString::en("x"), LocalizedString::en("x"));
    let index = TargetIndex::from_categories(vec![keyless, existing("a")]);

    assert_eq!(index.len(), 1);
}

// ── Scalar fields ───────────────────────────────────────────────

#[test]
fn identical_category_has_empty_change_set() {
    let actions = diff(&draft("shoes"), &existing("shoes"), &KeyLookup::new());
    assert!(actions.is_empty());
}

#[test]
fn each_changed_field_yields_one_action() {
    let mut d = draft("shoes");
    d.name = LocalizedString::en("Footwear");
    d.description = Some(LocalizedString::en("Everything for your feet"));
    d.order_hint = "0.5".into();
    d.meta_keywords = Some(LocalizedString::en("shoes, boots"));

    let actions = diff(&d, &existing("shoes"), &KeyLookup::new());

    assert_eq!(
        actions,
        vec![
            UpdateAction::ChangeName {
                name: LocalizedString::en("Footwear"),
            },
            UpdateAction::SetDescription {
                description: Some(LocalizedString::en("Everything for your feet")),
            },
            UpdateAction::ChangeOrderHint {
                order_hint: "0.5".into(),
            },
            UpdateAction::SetMetaKeywords {
                meta_keywords: Some(LocalizedString::en("shoes, boots")),
            },
        ]
    );
}

#[test]
fn removed_optional_field_is_unset() {
    let mut target = existing("shoes");
    target.external_id = Some("legacy-1".into());

    let actions = diff(&draft("shoes"), &target, &KeyLookup::new());

    assert_eq!(actions, vec![UpdateAction::SetExternalId { external_id: None }]);
}

#[test]
fn localized_values_compare_independent_of_locale_order() {
    let mut d = draft("shoes");
    d.name = LocalizedString::en("Shoes").with("de", "Schuhe");
    let mut target = existing("shoes");
    target.name = LocalizedString::of("de", "Schuhe").with("en", "Shoes");

    assert!(diff(&d, &target, &KeyLookup::new()).is_empty());
}

// ── Parent ──────────────────────────────────────────────────────

#[test]
fn changed_parent_yields_one_parent_action_first() {
    let mut d = child("boots", "shoes");
    d.name = LocalizedString::en("Boots!");
    let target = existing_under("boots", "clothing");

    let actions = diff(&d, &target, &KeyLookup::new());

    assert_eq!(names(&actions), vec!["changeParent", "changeName"]);
    assert_eq!(
        actions[0],
        UpdateAction::ChangeParent {
            parent: Some(ResourceIdentifier::category(key("shoes"))),
        }
    );
}

#[test]
fn same_parent_key_is_unchanged() {
    let actions = diff(
        &child("boots", "shoes"),
        &existing_under("boots", "shoes"),
        &KeyLookup::new(),
    );
    assert!(actions.is_empty());
}

#[test]
fn parent_key_resolved_through_lookup() {
    let parent_id = ResourceId::new();
    let target = existing("boots").with_parent(Reference::category(parent_id));
    let mut lookup = KeyLookup::new();
    lookup.insert(catsync_types::ReferenceTypeId::Category, parent_id, key("shoes"));

    assert!(diff(&child("boots", "shoes"), &target, &lookup).is_empty());
}

#[test]
fn unresolvable_existing_parent_counts_as_changed() {
    let target = existing("boots").with_parent(Reference::category(ResourceId::new()));

    let actions = diff(&child("boots", "shoes"), &target, &KeyLookup::new());

    assert_eq!(names(&actions), vec!["changeParent"]);
}

#[test]
fn moving_to_root_clears_the_parent() {
    let actions = diff(
        &draft("boots"),
        &existing_under("boots", "shoes"),
        &KeyLookup::new(),
    );
    assert_eq!(actions, vec![UpdateAction::ChangeParent { parent: None }]);
}

// ── Custom fields ───────────────────────────────────────────────

#[test]
fn custom_fields_added_to_plain_category_set_the_type() {
    let d = draft("shoes").with_custom(custom_draft("shoe-type", &[("size", json!(42))]));

    let actions = diff(&d, &existing("shoes"), &KeyLookup::new());

    let mut fields = BTreeMap::new();
    fields.insert("size".to_string(), json!(42));
    assert_eq!(
        actions,
        vec![UpdateAction::SetCustomType {
            type_id: Some(ResourceIdentifier::custom_type(key("shoe-type"))),
            fields: Some(fields),
        }]
    );
}

#[test]
fn removed_custom_fields_clear_the_type() {
    let target = existing("shoes").with_custom(custom("shoe-type", &[("size", json!(42))]));

    let actions = diff(&draft("shoes"), &target, &KeyLookup::new());

    assert_eq!(
        actions,
        vec![UpdateAction::SetCustomType {
            type_id: None,
            fields: None,
        }]
    );
}

#[test]
fn type_change_supersedes_field_actions() {
    let d = draft("shoes").with_custom(custom_draft(
        "new-type",
        &[("size", json!(43)), ("color", json!("red"))],
    ));
    let target = existing("shoes").with_custom(custom("old-type", &[("size", json!(42))]));

    let actions = diff(&d, &target, &KeyLookup::new());

    assert_eq!(names(&actions), vec!["setCustomType"]);
}

#[test]
fn field_changes_are_one_action_each_in_name_order() {
    let d = draft("shoes").with_custom(custom_draft(
        "shoe-type",
        &[
            ("size", json!(43)),
            ("color", json!("red")),
            ("material", json!("leather")),
        ],
    ));
    let target = existing("shoes").with_custom(custom(
        "shoe-type",
        &[
            ("size", json!(42)),
            ("material", json!("leather")),
            ("discontinued", json!(false)),
        ],
    ));

    let actions = diff(&d, &target, &KeyLookup::new());

    assert_eq!(
        actions,
        vec![
            UpdateAction::SetCustomField {
                name: "color".into(),
                value: Some(json!("red")),
            },
            UpdateAction::SetCustomField {
                name: "discontinued".into(),
                value: None,
            },
            UpdateAction::SetCustomField {
                name: "size".into(),
                value: Some(json!(43)),
            },
        ]
    );
}

#[test]
fn custom_actions_come_after_parent_and_scalars() {
    let mut d = child("boots", "shoes").with_custom(custom_draft("t1", &[("a", json!(1))]));
    d.slug = LocalizedString::en("new-slug");
    let target = existing_under("boots", "clothing").with_custom(custom("t1", &[]));

    let actions = diff(&d, &target, &KeyLookup::new());

    assert_eq!(
        names(&actions),
        vec!["changeParent", "changeSlug", "setCustomField"]
    );
}

// ── decide ──────────────────────────────────────────────────────

#[test]
fn decide_creates_when_unmatched() {
    assert_eq!(
        decide(&draft("shoes"), None, &KeyLookup::new()),
        SyncAction::Create
    );
}

#[test]
fn decide_is_noop_when_equal() {
    let target = existing("shoes");
    assert_eq!(
        decide(&draft("shoes"), Some(&target), &KeyLookup::new()),
        SyncAction::NoOp
    );
}

#[test]
fn decide_updates_against_current_version() {
    let mut target = existing("shoes");
    target.version = 7;
    let mut d = draft("shoes");
    d.slug = LocalizedString::en("footwear");

    match decide(&d, Some(&target), &KeyLookup::new()) {
        SyncAction::Update { version, actions } => {
            assert_eq!(version, 7);
            assert_eq!(names(&actions), vec!["changeSlug"]);
        }
        other => panic!("expected update, got {other:?}"),
    }
}

// ── Properties ──────────────────────────────────────────────────

fn arb_parent() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop::sample::select(vec!["p-one", "p-two", "p-three"]).prop_map(String::from))
}

fn build_draft(name: &str, parent: &Option<String>, hint: &str) -> CategoryDraft {
    let mut d = draft("subject");
    d.name = LocalizedString::en(name);
    d.order_hint = hint.to_string();
    if let Some(parent) = parent {
        d = d.with_parent(key(parent));
    }
    d
}

fn build_existing(name: &str, parent: &Option<String>, hint: &str) -> Category {
    let mut c = existing("subject");
    c.name = LocalizedString::en(name);
    c.order_hint = hint.to_string();
    if let Some(parent) = parent {
        c = c.with_parent(Reference::category(ResourceId::new()).expanded(Some(key(parent))));
    }
    c
}

proptest! {
    #[test]
    fn change_set_has_at_most_one_action_per_field(
        source_name in "[a-z]{1,6}",
        target_name in "[a-z]{1,6}",
        source_parent in arb_parent(),
        target_parent in arb_parent(),
        source_hint in "0\\.[0-9]",
        target_hint in "0\\.[0-9]",
    ) {
        let d = build_draft(&source_name, &source_parent, &source_hint);
        let existing = build_existing(&target_name, &target_parent, &target_hint);

        let actions = diff(&d, &existing, &KeyLookup::new());

        let distinct: HashSet<&str> = actions.iter().map(UpdateAction::name).collect();
        prop_assert_eq!(distinct.len(), actions.len());

        let parent_actions = actions.iter().filter(|a| a.is_parent_change()).count();
        prop_assert_eq!(parent_actions, usize::from(source_parent != target_parent));
        if parent_actions == 1 {
            prop_assert!(actions[0].is_parent_change());
        }

        let expected = usize::from(source_parent != target_parent)
            + usize::from(source_name != target_name)
            + usize::from(source_hint != target_hint);
        prop_assert_eq!(actions.len(), expected);
    }

    #[test]
    fn applying_nothing_to_an_equal_category_is_a_noop(
        name in "[a-z]{1,8}",
        parent in arb_parent(),
    ) {
        let d = build_draft(&name, &parent, "0.1");
        let existing = build_existing(&name, &parent, "0.1");
        prop_assert_eq!(decide(&d, Some(&existing), &KeyLookup::new()), SyncAction::NoOp);
    }
}
