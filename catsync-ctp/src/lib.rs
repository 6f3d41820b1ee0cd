//! commercetools HTTP client for catsync.
//!
//! Implements [`catsync_sync::CatalogClient`] against the commercetools
//! HTTP API:
//! - OAuth2 client-credentials authentication with a cached access token
//! - Cursor pagination over `id`, with `parent` and `custom.type` expanded
//! - Category create, and update by key
//!
//! The API has no way to detach a category from its parent: `changeParent`
//! requires one. The client reports this through
//! [`CatalogClient::supports_root_moves`](catsync_sync::CatalogClient::supports_root_moves),
//! and a category moved to the root in the source is reported as warned
//! while keeping its target parent.
//!
//! HTTP statuses are mapped onto [`catsync_sync::CatalogError`] so the sync
//! engine can tell validation failures from retryable ones.

mod auth;
mod client;
mod config;
mod error;

pub use client::CtpClient;
pub use config::{CtpConfig, DEFAULT_API_URL, DEFAULT_AUTH_URL, DEFAULT_TIMEOUT_SECS};
pub use error::{CtpError, CtpResult};
