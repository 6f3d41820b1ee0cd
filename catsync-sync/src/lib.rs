//! Category sync engine for catsync.
//!
//! Converges the categories of a target catalog project toward those of a
//! source project, one direction only.
//!
//! # Architecture
//!
//! Source and target categories reference each other by opaque ids, which
//! are meaningless across projects. The engine rewrites every reference to
//! the referenced resource's key, matches drafts to target categories by
//! key, and writes the minimal change-set.
//!
//! ## Components
//!
//! - **Fetch**: Lists a whole project page by page, references expanded
//! - **Rewrite**: Turns fetched categories into key-based drafts, rejecting
//!   dangling and circular references
//! - **Diff**: Matches drafts to target categories and computes change-sets
//! - **Executor**: Applies creates and updates with bounded concurrency,
//!   retry and per-category failure isolation
//! - **Stats**: Aggregates outcomes into run statistics
//! - **Orchestrator**: Sequences a run as a state machine
//!
//! # Example
//!
//! ```
//! use catsync_sync::client::mock::InMemoryCatalog;
//! use catsync_sync::{RunOrchestrator, RunState, SyncOptions};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let source = Arc::new(InMemoryCatalog::new("source"));
//! let target = Arc::new(InMemoryCatalog::new("target"));
//!
//! let orchestrator = RunOrchestrator::new(source, target, SyncOptions::default());
//! let report = orchestrator.run().await;
//! assert_eq!(report.state, RunState::Done);
//! # });
//! ```

pub mod client;
mod config;
mod diff;
mod engine;
mod error;
mod executor;
mod fetch;
mod lookup;
mod orchestrator;
mod outcome;
pub mod retry;
mod rewrite;
mod stats;

pub use client::{CatalogClient, Expansion, MAX_PAGE_SIZE, Page, QueryRequest, WriteResponse};
pub use config::{
    DEFAULT_CONCURRENCY, ErrorCallback, SyncConfig, SyncOptions, SyncOptionsBuilder,
    WarningCallback,
};
pub use diff::{MatchResult, SyncAction, TargetIndex, decide, diff, match_draft};
pub use engine::CategorySync;
pub use error::{
    CatalogError, CatalogResult, EntityFailure, ReferenceError, SyncError, SyncResult,
};
pub use executor::SyncExecutor;
pub use fetch::{FetchedCatalog, fetch_all, validate_page_size};
pub use lookup::KeyLookup;
pub use orchestrator::{RunOrchestrator, RunReport, RunState};
pub use outcome::{Outcome, OutcomeKind};
pub use retry::{RetryConfig, with_retry};
pub use rewrite::{PortableDraft, RejectedCategory, RewriteOutcome, rewrite_all, to_portable_draft};
pub use stats::{RunStatistics, StatisticsAggregator};
