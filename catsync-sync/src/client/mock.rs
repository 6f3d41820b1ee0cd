//! An in-memory catalog project for testing.
//!
//! Behaves like a real catalog for the operations the engine uses: id-sorted
//! cursor pagination, reference expansion, key-unique creates, versioned
//! updates, and validation of parent and custom type keys. Failures,
//! warnings and write latency can be injected per category key.

use super::{CatalogClient, Expansion, Page, QueryRequest, WriteResponse};
use crate::error::{CatalogError, CatalogResult};
use async_trait::async_trait;
use catsync_types::{
    Category, CategoryDraft, CustomFields, Key, Reference, ResourceId, ResourceIdentifier,
    UpdateAction,
};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Inner {
    /// Keyed by id so iteration order is the pagination order.
    categories: BTreeMap<ResourceId, Category>,
    custom_types: HashMap<ResourceId, Key>,
    write_failures: HashMap<Key, VecDeque<CatalogError>>,
    write_warnings: HashMap<Key, Vec<String>>,
    query_failures: HashMap<usize, CatalogError>,
    repeat_cursor: bool,
    refuse_root_moves: bool,
    pages_served: usize,
    write_log: Vec<(String, Key)>,
}

impl Inner {
    fn find_by_key(&self, key: &Key) -> Option<&Category> {
        self.categories
            .values()
            .find(|c| c.key.as_ref() == Some(key))
    }

    fn category_id_for(&self, key: &Key) -> CatalogResult<ResourceId> {
        self.find_by_key(key).map(|c| c.id).ok_or_else(|| {
            CatalogError::Validation(format!("parent category with key '{key}' not found"))
        })
    }

    fn type_id_for(&self, key: &Key) -> CatalogResult<ResourceId> {
        self.custom_types
            .iter()
            .find(|(_, k)| *k == key)
            .map(|(id, _)| *id)
            .ok_or_else(|| CatalogError::Validation(format!("custom type with key '{key}' not found")))
    }

    fn expand(&self, mut category: Category, expansions: &[Expansion]) -> Category {
        if expansions.contains(&Expansion::Parent) {
            if let Some(parent) = category.parent.take() {
                category.parent = Some(match self.categories.get(&parent.id) {
                    Some(target) => Reference::category(parent.id).expanded(target.key.clone()),
                    None => Reference::category(parent.id),
                });
            }
        }
        if expansions.contains(&Expansion::CustomType) {
            if let Some(custom) = category.custom.as_mut() {
                let id = custom.type_ref.id;
                custom.type_ref = match self.custom_types.get(&id) {
                    Some(key) => Reference::custom_type(id).expanded(Some(key.clone())),
                    None => Reference::custom_type(id),
                };
            }
        }
        category
    }

    fn expand_all(&self, category: Category) -> Category {
        self.expand(category, &Expansion::all())
    }

    fn take_failure(&mut self, key: &Key) -> Option<CatalogError> {
        self.write_failures.get_mut(key).and_then(VecDeque::pop_front)
    }

    fn warnings_for(&self, key: &Key) -> Vec<String> {
        self.write_warnings.get(key).cloned().unwrap_or_default()
    }

    fn custom_from_draft(
        &self,
        type_id: &ResourceIdentifier,
        fields: BTreeMap<String, serde_json::Value>,
    ) -> CatalogResult<CustomFields> {
        Ok(CustomFields {
            type_ref: Reference::custom_type(self.type_id_for(&type_id.key)?),
            fields,
        })
    }

    /// Whether making `parent` the parent of `child` would close a loop.
    fn creates_cycle(&self, child: ResourceId, parent: ResourceId) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(parent);
        while let Some(id) = current {
            if id == child || !seen.insert(id) {
                return true;
            }
            current = self
                .categories
                .get(&id)
                .and_then(|c| c.parent.as_ref())
                .map(|p| p.id);
        }
        false
    }

    fn apply(&self, category: &mut Category, action: &UpdateAction) -> CatalogResult<()> {
        match action {
            UpdateAction::ChangeParent { parent } => {
                category.parent = match parent {
                    Some(parent) => {
                        let parent_id = self.category_id_for(&parent.key)?;
                        if self.creates_cycle(category.id, parent_id) {
                            return Err(CatalogError::Validation(format!(
                                "moving '{}' under '{}' would create a cycle",
                                category.label(),
                                parent.key
                            )));
                        }
                        Some(Reference::category(parent_id))
                    }
                    None if self.refuse_root_moves => {
                        return Err(CatalogError::Validation(format!(
                            "changeParent for '{}' requires a parent",
                            category.label()
                        )));
                    }
                    None => None,
                };
            }
            UpdateAction::ChangeName { name } => category.name = name.clone(),
            UpdateAction::ChangeSlug { slug } => category.slug = slug.clone(),
            UpdateAction::SetDescription { description } => {
                category.description = description.clone()
            }
            UpdateAction::ChangeOrderHint { order_hint } => {
                category.order_hint = order_hint.clone()
            }
            UpdateAction::SetExternalId { external_id } => {
                category.external_id = external_id.clone()
            }
            UpdateAction::SetMetaTitle { meta_title } => category.meta_title = meta_title.clone(),
            UpdateAction::SetMetaDescription { meta_description } => {
                category.meta_description = meta_description.clone()
            }
            UpdateAction::SetMetaKeywords { meta_keywords } => {
                category.meta_keywords = meta_keywords.clone()
            }
            UpdateAction::SetCustomType { type_id, fields } => {
                category.custom = match type_id {
                    Some(type_id) => {
                        Some(self.custom_from_draft(type_id, fields.clone().unwrap_or_default())?)
                    }
                    None => None,
                };
            }
            UpdateAction::SetCustomField { name, value } => {
                let label = category.label();
                let custom = category.custom.as_mut().ok_or_else(|| {
                    CatalogError::Validation(format!(
                        "category '{label}' has no custom type; cannot set field '{name}'"
                    ))
                })?;
                match value {
                    Some(value) => {
                        custom.fields.insert(name.clone(), value.clone());
                    }
                    None => {
                        custom.fields.remove(name);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Decrements the in-flight write counter when dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(current: &'a AtomicUsize, max: &AtomicUsize) -> Self {
        let now = current.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(current)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An in-memory catalog project.
#[derive(Debug)]
pub struct InMemoryCatalog {
    project_key: String,
    inner: Mutex<Inner>,
    write_delay: Mutex<Duration>,
    queries: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    closed: AtomicBool,
}

impl InMemoryCatalog {
    /// Creates an empty project.
    pub fn new(project_key: impl Into<String>) -> Self {
        Self {
            project_key: project_key.into(),
            inner: Mutex::new(Inner::default()),
            write_delay: Mutex::new(Duration::ZERO),
            queries: AtomicUsize::new(0),
            creates: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock only happens in a failing test.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_open(&self) -> CatalogResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CatalogError::Closed);
        }
        Ok(())
    }

    // ── Setup ────────────────────────────────────────────────────

    /// Registers a custom type and returns its id.
    pub fn add_custom_type(&self, key: Key) -> ResourceId {
        let id = ResourceId::new();
        self.lock().custom_types.insert(id, key);
        id
    }

    /// Stores a category as-is, without validating its references.
    /// Useful to set up dangling or circular source data.
    pub fn insert(&self, category: Category) -> Category {
        self.lock().categories.insert(category.id, category.clone());
        category
    }

    /// Stores a category built from a draft, validating it like `create`
    /// but without counting it as a write.
    pub fn insert_draft(&self, draft: &CategoryDraft) -> CatalogResult<Category> {
        self.store_draft(draft)
    }

    /// Queues a failure for the next write of `key`.
    pub fn fail_next_write(&self, key: &Key, error: CatalogError) {
        self.lock()
            .write_failures
            .entry(key.clone())
            .or_default()
            .push_back(error);
    }

    /// Makes every successful write of `key` report a warning.
    pub fn warn_on_write(&self, key: &Key, warning: impl Into<String>) {
        self.lock()
            .write_warnings
            .entry(key.clone())
            .or_default()
            .push(warning.into());
    }

    /// Makes the query for the given zero-based page fail.
    pub fn fail_page(&self, page: usize, error: CatalogError) {
        self.lock().query_failures.insert(page, error);
    }

    /// Makes the project reject `changeParent` without a parent.
    pub fn refuse_root_moves(&self) {
        self.lock().refuse_root_moves = true;
    }

    /// Makes every page hand back the cursor it was called with.
    pub fn repeat_cursor(&self) {
        self.lock().repeat_cursor = true;
    }

    /// Delays every create and update, to make concurrency observable.
    pub fn set_write_delay(&self, delay: Duration) {
        *self
            .write_delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = delay;
    }

    /// An open copy of this project's categories and custom types, with
    /// counters, logs and injected behavior reset.
    pub fn duplicate(&self) -> Self {
        let copy = Self::new(self.project_key.clone());
        {
            let inner = self.lock();
            let mut target = copy.lock();
            target.categories = inner.categories.clone();
            target.custom_types = inner.custom_types.clone();
        }
        copy
    }

    // ── Inspection ───────────────────────────────────────────────

    /// Returns the category with `key`, references expanded.
    pub fn get_by_key(&self, key: &Key) -> Option<Category> {
        let inner = self.lock();
        inner.find_by_key(key).cloned().map(|c| inner.expand_all(c))
    }

    /// Returns every category in id order, references expanded.
    pub fn categories(&self) -> Vec<Category> {
        let inner = self.lock();
        inner
            .categories
            .values()
            .cloned()
            .map(|c| inner.expand_all(c))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The key of the parent of the category with `key`.
    pub fn parent_key_of(&self, key: &Key) -> Option<Key> {
        self.get_by_key(key)?.parent?.expanded_key().cloned()
    }

    /// Every successful write as `(operation, key)`, in completion order.
    pub fn write_log(&self) -> Vec<(String, Key)> {
        self.lock().write_log.clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Create plus update requests received, including failed ones.
    pub fn write_count(&self) -> usize {
        self.create_count() + self.update_count()
    }

    /// The highest number of writes that were in flight at the same time.
    pub fn max_in_flight_writes(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // ── Internals ────────────────────────────────────────────────

    async fn simulate_latency(&self) {
        let delay = *self
            .write_delay
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn store_draft(&self, draft: &CategoryDraft) -> CatalogResult<Category> {
        let mut inner = self.lock();
        if inner.find_by_key(&draft.key).is_some() {
            return Err(CatalogError::Validation(format!(
                "a category with key '{}' already exists",
                draft.key
            )));
        }

        let parent = match &draft.parent {
            Some(parent) => Some(Reference::category(inner.category_id_for(&parent.key)?)),
            None => None,
        };
        let custom = match &draft.custom {
            Some(custom) => Some(inner.custom_from_draft(&custom.type_id, custom.fields.clone())?),
            None => None,
        };

        let mut category = Category::new(Some(draft.key.clone()), draft.name.clone(), draft.slug.clone());
        category.description = draft.description.clone();
        category.parent = parent;
        category.order_hint = draft.order_hint.clone();
        category.external_id = draft.external_id.clone();
        category.meta_title = draft.meta_title.clone();
        category.meta_description = draft.meta_description.clone();
        category.meta_keywords = draft.meta_keywords.clone();
        category.custom = custom;

        inner.categories.insert(category.id, category.clone());
        Ok(inner.expand_all(category))
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalog {
    fn project_key(&self) -> &str {
        &self.project_key
    }

    fn supports_root_moves(&self) -> bool {
        !self.lock().refuse_root_moves
    }

    async fn query(&self, request: &QueryRequest) -> CatalogResult<Page> {
        self.ensure_open()?;
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.lock();
        let page_no = inner.pages_served;
        inner.pages_served += 1;
        if let Some(error) = inner.query_failures.remove(&page_no) {
            return Err(error);
        }

        let after = match &request.cursor {
            Some(cursor) => Some(
                ResourceId::from_cursor(cursor)
                    .map_err(|e| CatalogError::Protocol(format!("bad cursor '{cursor}': {e}")))?,
            ),
            None => None,
        };

        let limit = request.limit as usize;
        let mut remaining = inner
            .categories
            .values()
            .filter(|c| after.is_none_or(|after| c.id > after));
        let results: Vec<Category> = remaining
            .by_ref()
            .take(limit)
            .cloned()
            .map(|c| inner.expand(c, &request.expansions))
            .collect();
        let has_more = remaining.next().is_some();

        let next_cursor = if inner.repeat_cursor {
            request.cursor.clone().or_else(|| results.last().map(|c| c.id.cursor()))
        } else if has_more {
            results.last().map(|c| c.id.cursor())
        } else {
            None
        };

        Ok(Page {
            results,
            next_cursor,
        })
    }

    async fn create(&self, draft: &CategoryDraft) -> CatalogResult<WriteResponse> {
        self.ensure_open()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
        self.simulate_latency().await;

        if let Some(error) = self.lock().take_failure(&draft.key) {
            return Err(error);
        }
        let category = self.store_draft(draft)?;

        let mut inner = self.lock();
        inner.write_log.push(("create".to_string(), draft.key.clone()));
        Ok(WriteResponse {
            category,
            warnings: inner.warnings_for(&draft.key),
        })
    }

    async fn update(
        &self,
        key: &Key,
        version: u64,
        actions: &[UpdateAction],
    ) -> CatalogResult<WriteResponse> {
        self.ensure_open()?;
        self.updates.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.max_in_flight);
        self.simulate_latency().await;

        let mut inner = self.lock();
        if let Some(error) = inner.take_failure(key) {
            return Err(error);
        }

        let mut category = inner
            .find_by_key(key)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("category with key '{key}'")))?;
        if category.version != version {
            return Err(CatalogError::Conflict(format!(
                "category '{key}' is at version {}, update was for version {version}",
                category.version
            )));
        }

        for action in actions {
            inner.apply(&mut category, action)?;
        }
        category.version += 1;
        inner.categories.insert(category.id, category.clone());
        inner.write_log.push(("update".to_string(), key.clone()));

        Ok(WriteResponse {
            category: inner.expand_all(category),
            warnings: inner.warnings_for(key),
        })
    }

    async fn close(&self) -> CatalogResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
