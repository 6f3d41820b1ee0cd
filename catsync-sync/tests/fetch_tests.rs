//! Tests for the paginated fetcher.

mod common;

use catsync_sync::client::mock::InMemoryCatalog;
use catsync_sync::{CatalogError, MAX_PAGE_SIZE, SyncError, fetch_all, validate_page_size};
use catsync_types::{CustomFieldsDraft, ReferenceTypeId};
use common::{catalog_with, child, draft, key};

fn numbered(count: usize) -> Vec<catsync_types::CategoryDraft> {
    (0..count).map(|i| draft(&format!("cat-{i}"))).collect()
}

// ── Pagination ──────────────────────────────────────────────────

#[tokio::test]
async fn fetches_every_page() {
    let catalog = catalog_with("source", &numbered(7));

    let fetched = fetch_all(catalog.as_ref(), 3).await.unwrap();

    assert_eq!(fetched.len(), 7);
    assert_eq!(fetched.pages, 3);
    assert_eq!(catalog.query_count(), 3);
    assert_eq!(fetched.project, "source");
}

#[tokio::test]
async fn stops_after_exactly_full_last_page() {
    let catalog = catalog_with("source", &numbered(6));

    let fetched = fetch_all(catalog.as_ref(), 3).await.unwrap();

    assert_eq!(fetched.len(), 6);
    assert_eq!(fetched.pages, 2);
}

#[tokio::test]
async fn single_page_when_everything_fits() {
    let catalog = catalog_with("source", &numbered(4));

    let fetched = fetch_all(catalog.as_ref(), MAX_PAGE_SIZE).await.unwrap();

    assert_eq!(fetched.len(), 4);
    assert_eq!(fetched.pages, 1);
}

#[tokio::test]
async fn empty_project_yields_empty_listing() {
    let catalog = InMemoryCatalog::new("empty");

    let fetched = fetch_all(&catalog, 10).await.unwrap();

    assert!(fetched.is_empty());
    assert_eq!(fetched.pages, 1);
}

#[tokio::test]
async fn listing_has_no_duplicates() {
    let catalog = catalog_with("source", &numbered(11));

    let fetched = fetch_all(catalog.as_ref(), 2).await.unwrap();

    let mut ids: Vec<_> = fetched.categories.iter().map(|c| c.id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 11);
}

// ── Expansion and lookup ────────────────────────────────────────

#[tokio::test]
async fn parent_references_are_expanded() {
    let catalog = catalog_with("source", &[draft("root"), child("leaf", "root")]);

    let fetched = fetch_all(catalog.as_ref(), 1).await.unwrap();

    let leaf = fetched
        .categories
        .iter()
        .find(|c| c.key == Some(key("leaf")))
        .unwrap();
    let parent = leaf.parent.as_ref().unwrap();
    assert!(parent.is_expanded());
    assert_eq!(parent.expanded_key(), Some(&key("root")));
}

#[tokio::test]
async fn lookup_resolves_categories_and_custom_types() {
    let catalog = InMemoryCatalog::new("source");
    let type_id = catalog.add_custom_type(key("shoe-type"));
    catalog
        .insert_draft(&draft("shoes").with_custom(CustomFieldsDraft::new(key("shoe-type"))))
        .unwrap();

    let fetched = fetch_all(&catalog, 5).await.unwrap();

    let shoes = &fetched.categories[0];
    assert_eq!(
        fetched.lookup.get(ReferenceTypeId::Category, shoes.id),
        Some(&key("shoes"))
    );
    assert_eq!(
        fetched.lookup.get(ReferenceTypeId::Type, type_id),
        Some(&key("shoe-type"))
    );
}

// ── Failures ────────────────────────────────────────────────────

#[tokio::test]
async fn failing_page_aborts_the_whole_fetch() {
    let catalog = catalog_with("source", &numbered(5));
    catalog.fail_page(1, CatalogError::Transient("connection reset".into()));

    let err = fetch_all(catalog.as_ref(), 2).await.unwrap_err();

    match err {
        SyncError::Fetch { project, source } => {
            assert_eq!(project, "source");
            assert!(matches!(source, CatalogError::Transient(_)));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn failing_first_page_aborts() {
    let catalog = catalog_with("target", &numbered(1));
    catalog.fail_page(0, CatalogError::Auth("invalid token".into()));

    let err = fetch_all(catalog.as_ref(), 10).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Fetch {
            source: CatalogError::Auth(_),
            ..
        }
    ));
}

#[tokio::test]
async fn repeated_cursor_is_a_fetch_failure() {
    let catalog = catalog_with("source", &numbered(5));
    catalog.repeat_cursor();

    let err = fetch_all(catalog.as_ref(), 2).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Fetch {
            source: CatalogError::Protocol(_),
            ..
        }
    ));
    assert_eq!(catalog.query_count(), 2);
}

// ── Page size ───────────────────────────────────────────────────

#[test]
fn page_size_bounds() {
    assert!(validate_page_size(1).is_ok());
    assert!(validate_page_size(MAX_PAGE_SIZE).is_ok());
    assert!(matches!(validate_page_size(0), Err(SyncError::Config(_))));
    assert!(matches!(
        validate_page_size(MAX_PAGE_SIZE + 1),
        Err(SyncError::Config(_))
    ));
}

#[tokio::test]
async fn invalid_page_size_issues_no_query() {
    let catalog = catalog_with("source", &numbered(1));

    let err = fetch_all(catalog.as_ref(), 0).await.unwrap_err();

    assert!(matches!(err, SyncError::Config(_)));
    assert_eq!(catalog.query_count(), 0);
}
