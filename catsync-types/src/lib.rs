//! Core type definitions for catsync.
//!
//! This crate defines the catalog model shared by the sync engine and the
//! catalog clients:
//! - Resource identifiers (opaque, per project) and keys (portable)
//! - Localized strings
//! - ID-based references and key-based resource identifiers
//! - Categories as fetched, and category drafts as sent to a target project
//! - Category update actions
//!
//! Everything here serializes to the commercetools JSON wire format
//! (camelCase fields, `typeId` references, `action`-tagged update actions).

mod action;
mod category;
mod ids;
mod localized;
mod reference;

pub use action::UpdateAction;
pub use category::{Category, CategoryDraft, CustomFields, CustomFieldsDraft};
pub use ids::{Key, ResourceId};
pub use localized::LocalizedString;
pub use reference::{ExpandedResource, Reference, ReferenceTypeId, ResourceIdentifier};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
