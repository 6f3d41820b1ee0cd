//! Error types for the sync layer.

use catsync_types::{ReferenceTypeId, ResourceId};
use std::time::Duration;
use thiserror::Error;

/// Result type for run-level sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for catalog client operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors that abort a run or misuse the engine.
///
/// Per-category failures never surface as a `SyncError`; they become
/// [`Outcome`](crate::Outcome)s instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A page request failed while listing a project. Partial listings are
    /// never used.
    #[error("failed to fetch categories from project '{project}': {source}")]
    Fetch {
        project: String,
        #[source]
        source: CatalogError,
    },

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The run was cancelled before it could complete.
    #[error("run cancelled")]
    Cancelled,

    /// The run exceeded its configured timeout.
    #[error("run timed out after {0:?}")]
    Timeout(Duration),

    /// An outcome was recorded after the statistics were finalized.
    #[error("statistics already finalized")]
    StatisticsFinalized,

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors returned by a catalog client.
#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    /// The target rejected the request on schema or business rules.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network failure, timeout or server error; worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The target asked us to slow down.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Optimistic concurrency check failed.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// The client handle was closed.
    #[error("client closed")]
    Closed,

    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl CatalogError {
    /// Whether a retry with backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Transient(_) | CatalogError::RateLimited { .. }
        )
    }

    /// Returns true if this error represents a rate-limit response.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, CatalogError::RateLimited { .. })
    }

    /// Returns the retry-after duration if this is a rate-limit error.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CatalogError::RateLimited { retry_after_secs } => {
                Some(Duration::from_secs(*retry_after_secs))
            }
            _ => None,
        }
    }
}

/// Why a source category could not be turned into a portable draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    /// The category itself has no key, so it cannot be matched in the target.
    #[error("category {id} has no key")]
    MissingKey { id: ResourceId },

    /// A reference points at a resource whose key is unknown.
    #[error("{type_id} reference {id} could not be resolved to a key")]
    Dangling {
        type_id: ReferenceTypeId,
        id: ResourceId,
    },

    /// The parent chain loops back on itself.
    #[error("circular parent chain: {}", format_path(.path))]
    Cycle { path: Vec<String> },
}

fn format_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Why a single category failed to sync.
#[derive(Debug, Clone, Error)]
pub enum EntityFailure {
    /// The target rejected or could not serve the write.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The run was cancelled before the write completed.
    #[error("cancelled")]
    Cancelled,

    /// The task processing the category ended without reporting back.
    #[error("sync task aborted: {0}")]
    Aborted(String),
}

impl EntityFailure {
    /// Whether the target rejected the write on schema or business rules.
    pub fn is_validation(&self) -> bool {
        matches!(self, EntityFailure::Catalog(CatalogError::Validation(_)))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, EntityFailure::Cancelled)
    }
}
