//! Paginated fetcher: lists every category of a project.
//!
//! Follows the continuation cursor until the project reports no further
//! pages. Any page failure aborts the whole fetch, so callers never see a
//! partial listing.

use crate::client::{CatalogClient, QueryRequest, MAX_PAGE_SIZE};
use crate::error::{CatalogError, SyncError, SyncResult};
use crate::lookup::KeyLookup;
use catsync_types::Category;
use std::collections::HashSet;
use tracing::{debug, info};

/// A complete listing of one project.
#[derive(Debug, Clone)]
pub struct FetchedCatalog {
    /// Key of the project the listing came from.
    pub project: String,
    /// Every category, references expanded, in listing order.
    pub categories: Vec<Category>,
    /// Keys of every category and expanded reference target seen.
    pub lookup: KeyLookup,
    /// Number of pages requested.
    pub pages: usize,
}

impl FetchedCatalog {
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Checks a caller-supplied page size against the catalog limit.
pub fn validate_page_size(page_size: u32) -> SyncResult<()> {
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(SyncError::Config(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

/// Fetches every category of the client's project with parent and custom
/// type references expanded.
pub async fn fetch_all(client: &dyn CatalogClient, page_size: u32) -> SyncResult<FetchedCatalog> {
    validate_page_size(page_size)?;
    let project = client.project_key().to_string();
    let fetch_error = |source: CatalogError| SyncError::Fetch {
        project: project.clone(),
        source,
    };

    let mut categories = Vec::new();
    let mut lookup = KeyLookup::new();
    let mut seen_cursors = HashSet::new();
    let mut request = QueryRequest::first_page(page_size);
    let mut pages = 0;

    loop {
        let page = client.query(&request).await.map_err(fetch_error)?;
        pages += 1;
        debug!(
            "Fetched page {} of project '{}' ({} categories)",
            pages,
            project,
            page.results.len()
        );

        for category in &page.results {
            lookup.observe(category);
        }
        categories.extend(page.results);

        match page.next_cursor {
            Some(cursor) => {
                if !seen_cursors.insert(cursor.clone()) {
                    return Err(fetch_error(CatalogError::Protocol(format!(
                        "cursor '{cursor}' was returned twice"
                    ))));
                }
                request = request.after(cursor);
            }
            None => break,
        }
    }

    info!(
        "Fetched {} categories from project '{}' in {} page(s)",
        categories.len(),
        project,
        pages
    );

    Ok(FetchedCatalog {
        project,
        categories,
        lookup,
        pages,
    })
}
