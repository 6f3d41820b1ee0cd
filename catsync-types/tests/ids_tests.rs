use catsync_types::{Key, ResourceId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── ResourceId ────────────────────────────────────────────────────

#[test]
fn resource_id_new_is_unique() {
    let a = ResourceId::new();
    let b = ResourceId::new();
    assert_ne!(a, b);
}

#[test]
fn resource_id_display_and_parse() {
    let id = ResourceId::new();
    let parsed: ResourceId = id.to_string().parse().unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn resource_id_parse_invalid() {
    assert!(ResourceId::from_str("garbage").is_err());
    assert!(ResourceId::from_cursor("not-a-uuid").is_err());
}

#[test]
fn cursor_reads_back_to_the_same_id() {
    let id = ResourceId::new();
    assert_eq!(ResourceId::from_cursor(&id.cursor()).unwrap(), id);
}

#[test]
fn after_predicate_quotes_the_id() {
    let id = ResourceId::new();
    assert_eq!(id.after_predicate(), format!("id > \"{id}\""));
}

#[test]
fn resource_ids_sort_by_creation() {
    let first = ResourceId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = ResourceId::new();
    assert!(first < second);
}

#[test]
fn resource_id_serializes_as_plain_string() {
    let id = ResourceId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
}

// ── Key ───────────────────────────────────────────────────────────

#[test]
fn key_accepts_typical_values() {
    for raw in ["men", "men-shoes", "SKU_123", "ab"] {
        let key = Key::new(raw).unwrap();
        assert_eq!(key.as_str(), raw);
        assert_eq!(key.to_string(), raw);
    }
}

#[test]
fn key_accepts_single_characters_and_punctuation() {
    for raw in ["a", "b", "has.dot", "men shoes", "küche", "men/shoes"] {
        assert_eq!(Key::new(raw).unwrap().as_str(), raw);
    }
}

#[test]
fn key_rejects_empty() {
    let err = Key::new("").unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn long_keys_are_kept_whole() {
    let raw = "k".repeat(1_000);
    assert_eq!(Key::new(raw.clone()).unwrap().as_str(), raw);
}

#[test]
fn key_deserialization_accepts_any_non_empty_string() {
    let ok: Key = serde_json::from_str("\"women\"").unwrap();
    assert_eq!(ok.as_str(), "women");
    let dotted: Key = serde_json::from_str("\"has.dot\"").unwrap();
    assert_eq!(dotted.as_str(), "has.dot");
    assert!(serde_json::from_str::<Key>("\"\"").is_err());
}

#[test]
fn key_hash_and_eq() {
    let mut set = HashSet::new();
    set.insert(Key::new("shoes").unwrap());
    set.insert(Key::new("shoes").unwrap());
    assert_eq!(set.len(), 1);
}

proptest! {
    #[test]
    fn non_empty_keys_are_accepted(raw in "\\PC{1,64}") {
        let key = Key::new(raw.clone()).unwrap();
        prop_assert_eq!(key.as_str(), raw.as_str());
    }
}
