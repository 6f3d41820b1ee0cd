//! Catalog client abstraction.
//!
//! Defines the trait the engine needs from a catalog project, so the same
//! engine works against the HTTP client, the in-memory catalog used in
//! tests, or any other backend.

use crate::error::CatalogResult;
use async_trait::async_trait;
use catsync_types::{Category, CategoryDraft, Key, UpdateAction};

pub mod mock;

/// Largest page the catalog returns for a single query.
pub const MAX_PAGE_SIZE: u32 = 500;

/// A reference path to expand inline in query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expansion {
    /// `parent`: the parent category.
    Parent,
    /// `custom.type`: the custom type of the custom fields.
    CustomType,
}

impl Expansion {
    /// The expansion path as understood by the catalog API.
    pub fn path(&self) -> &'static str {
        match self {
            Expansion::Parent => "parent",
            Expansion::CustomType => "custom.type",
        }
    }

    /// Every expansion the reference rewriter relies on.
    pub fn all() -> Vec<Expansion> {
        vec![Expansion::Parent, Expansion::CustomType]
    }
}

/// One page request of a category listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Maximum number of results on the page.
    pub limit: u32,
    /// References to expand inline.
    pub expansions: Vec<Expansion>,
    /// Continuation token from the previous page; `None` for the first page.
    pub cursor: Option<String>,
}

impl QueryRequest {
    /// The first page of a full listing with every expansion requested.
    pub fn first_page(limit: u32) -> Self {
        Self {
            limit,
            expansions: Expansion::all(),
            cursor: None,
        }
    }

    /// The request for the page after `cursor`.
    #[must_use]
    pub fn after(&self, cursor: String) -> Self {
        Self {
            cursor: Some(cursor),
            ..self.clone()
        }
    }
}

/// One page of a category listing.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub results: Vec<Category>,
    /// Token for the next page; `None` when the listing is complete.
    pub next_cursor: Option<String>,
}

/// Result of a successful create or update.
#[derive(Debug, Clone)]
pub struct WriteResponse {
    /// The category as stored after the write, references expanded.
    pub category: Category,
    /// Non-fatal issues the catalog reported about the write.
    pub warnings: Vec<String>,
}

impl WriteResponse {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            warnings: Vec::new(),
        }
    }
}

/// An authenticated handle to one catalog project.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// The key of the project this client talks to.
    fn project_key(&self) -> &str;

    /// Whether `changeParent` without a parent is accepted. When it is not,
    /// categories moved to the root in the source keep their target parent.
    fn supports_root_moves(&self) -> bool {
        true
    }

    /// Fetches one page of categories.
    async fn query(&self, request: &QueryRequest) -> CatalogResult<Page>;

    /// Creates a category from a draft.
    async fn create(&self, draft: &CategoryDraft) -> CatalogResult<WriteResponse>;

    /// Applies an ordered change-set to the category with the given key.
    /// `version` is the version the change-set was computed against.
    async fn update(
        &self,
        key: &Key,
        version: u64,
        actions: &[UpdateAction],
    ) -> CatalogResult<WriteResponse>;

    /// Releases the connection resources held by this client.
    /// Later calls fail with [`CatalogError::Closed`](crate::CatalogError::Closed).
    async fn close(&self) -> CatalogResult<()>;
}
