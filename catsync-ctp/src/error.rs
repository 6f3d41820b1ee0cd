//! Client construction errors.
//!
//! Errors of individual requests are reported as
//! [`CatalogError`](catsync_sync::CatalogError)s instead.

use thiserror::Error;

/// Result type for client construction.
pub type CtpResult<T> = Result<T, CtpError>;

/// Errors that prevent a client from being built.
#[derive(Debug, Error)]
pub enum CtpError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
