//! Shared test helpers for sync tests.

#![allow(dead_code)]

use catsync_sync::client::mock::InMemoryCatalog;
use catsync_sync::{CatalogError, EntityFailure, RetryConfig, SyncOptions, SyncOptionsBuilder};
use catsync_types::{CategoryDraft, Key, LocalizedString};
use std::sync::{Arc, Mutex};

pub fn key(s: &str) -> Key {
    Key::new(s).unwrap()
}

/// A root draft whose name and slug derive from its key.
pub fn draft(k: &str) -> CategoryDraft {
    CategoryDraft::new(
        key(k),
        LocalizedString::en(format!("Category {k}")),
        LocalizedString::en(format!("{k}-slug")),
    )
}

pub fn child(k: &str, parent: &str) -> CategoryDraft {
    draft(k).with_parent(key(parent))
}

/// A project holding the given drafts, created in order.
pub fn catalog_with(project: &str, drafts: &[CategoryDraft]) -> Arc<InMemoryCatalog> {
    let catalog = InMemoryCatalog::new(project);
    for d in drafts {
        catalog.insert_draft(d).unwrap();
    }
    Arc::new(catalog)
}

pub fn validation(message: &str) -> CatalogError {
    CatalogError::Validation(message.to_string())
}

/// Retry settings that keep tests fast.
pub fn fast_retry() -> RetryConfig {
    RetryConfig {
        min_delay_ms: 1,
        max_delay_ms: 5,
        max_retries: 3,
        with_jitter: false,
    }
}

/// Messages passed to the error and warning callbacks.
#[derive(Clone, Default)]
pub struct Reports {
    pub errors: Arc<Mutex<Vec<(String, String)>>>,
    pub warnings: Arc<Mutex<Vec<(String, String)>>>,
}

impl Reports {
    pub fn errors(&self) -> Vec<(String, String)> {
        self.errors.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.lock().unwrap().clone()
    }
}

/// A builder with fast retries and callbacks that record into `Reports`.
pub fn recording_builder() -> (SyncOptionsBuilder, Reports) {
    let reports = Reports::default();
    let errors = Arc::clone(&reports.errors);
    let warnings = Arc::clone(&reports.warnings);
    let builder = SyncOptions::builder()
        .retry(fast_retry())
        .error_callback(move |message: &str, cause: &EntityFailure| {
            errors
                .lock()
                .unwrap()
                .push((message.to_string(), cause.to_string()));
        })
        .warning_callback(move |message: &str, context: &str| {
            warnings
                .lock()
                .unwrap()
                .push((message.to_string(), context.to_string()));
        });
    (builder, reports)
}

pub fn recording_options() -> (SyncOptions, Reports) {
    let (builder, reports) = recording_builder();
    (builder.build(), reports)
}
