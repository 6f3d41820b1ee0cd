//! Sync executor: applies one decided action against the target.
//!
//! The executor is the unit of failure isolation. Every call produces an
//! [`Outcome`]; errors are converted into `Failed` outcomes and reported
//! through the injected error callback instead of being propagated.

use crate::client::{CatalogClient, WriteResponse};
use crate::config::SyncOptions;
use crate::diff::SyncAction;
use crate::error::{CatalogResult, EntityFailure};
use crate::outcome::Outcome;
use crate::retry::with_retry;
use catsync_types::{Category, CategoryDraft, UpdateAction};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Applies create and update actions with bounded concurrency.
///
/// All clones of an executor share one semaphore, so the number of target
/// writes in flight never exceeds the configured concurrency.
#[derive(Clone)]
pub struct SyncExecutor {
    client: Arc<dyn CatalogClient>,
    options: SyncOptions,
    limiter: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl SyncExecutor {
    pub fn new(client: Arc<dyn CatalogClient>, options: SyncOptions, cancel: CancellationToken) -> Self {
        let permits = options.config.concurrency.max(1);
        Self {
            client,
            options,
            limiter: Arc::new(Semaphore::new(permits)),
            cancel,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Applies `action` for `draft` and reports what happened.
    pub async fn execute(&self, draft: &CategoryDraft, action: SyncAction) -> Outcome {
        self.apply(draft, action).await.0
    }

    /// Like [`execute`](Self::execute), also returning the category as
    /// stored by a successful write.
    pub(crate) async fn apply(
        &self,
        draft: &CategoryDraft,
        action: SyncAction,
    ) -> (Outcome, Option<Category>) {
        let key = &draft.key;
        match action {
            SyncAction::NoOp => {
                debug!("Category '{}' is up to date", key);
                (Outcome::Unchanged { key: key.clone() }, None)
            }
            SyncAction::Create => {
                let result = self
                    .write(key.as_str(), || self.client.create(draft))
                    .await;
                match result {
                    Ok(response) => {
                        let created = Outcome::Created { key: key.clone() };
                        self.written(draft, "created", created, response)
                    }
                    Err(failure) => {
                        let message = format!("Failed to create draft with key: '{key}'.");
                        (self.fail(key.as_str(), &message, failure), None)
                    }
                }
            }
            SyncAction::Update {
                version,
                mut actions,
            } => {
                let mut notes = Vec::new();
                if !self.client.supports_root_moves()
                    && actions.iter().any(UpdateAction::is_root_move)
                {
                    actions.retain(|action| !action.is_root_move());
                    notes.push(format!(
                        "project '{}' cannot move categories to the root; the current parent was kept",
                        self.client.project_key()
                    ));
                    if actions.is_empty() {
                        let message = format!("Category with key '{key}' was not moved to the root.");
                        return (self.warn(key.as_str(), &message, notes.join("; ")), None);
                    }
                }
                debug!(
                    "Updating category '{}' at version {} with {} action(s)",
                    key,
                    version,
                    actions.len()
                );
                let result = self
                    .write(key.as_str(), || self.client.update(key, version, &actions))
                    .await;
                match result {
                    Ok(mut response) => {
                        notes.append(&mut response.warnings);
                        response.warnings = notes;
                        let updated = Outcome::Updated {
                            key: key.clone(),
                            actions: actions.len(),
                        };
                        self.written(draft, "updated", updated, response)
                    }
                    Err(failure) => {
                        let message = format!("Failed to update category with key: '{key}'.");
                        (self.fail(key.as_str(), &message, failure), None)
                    }
                }
            }
        }
    }

    /// Records a failure for `subject` and reports it through the error
    /// callback.
    pub fn fail(&self, subject: &str, message: &str, failure: EntityFailure) -> Outcome {
        self.options.report_error(message, &failure);
        Outcome::Failed {
            subject: subject.to_string(),
            error: failure,
        }
    }

    /// Records a warning for `subject` and reports it through the warning
    /// callback.
    pub fn warn(&self, subject: &str, message: &str, reason: String) -> Outcome {
        self.options.report_warning(message, &reason);
        Outcome::Warned {
            subject: subject.to_string(),
            reason,
        }
    }

    fn written(
        &self,
        draft: &CategoryDraft,
        verb: &str,
        success: Outcome,
        response: WriteResponse,
    ) -> (Outcome, Option<Category>) {
        if response.warnings.is_empty() {
            debug!("Category '{}' {}", draft.key, verb);
            return (success, Some(response.category));
        }
        let message = format!("Category with key '{}' was {} with warnings.", draft.key, verb);
        let outcome = self.warn(draft.key.as_str(), &message, response.warnings.join("; "));
        (outcome, Some(response.category))
    }

    /// Runs one write under a concurrency permit, retrying transient
    /// failures, and gives up as soon as the run is cancelled.
    async fn write<F, Fut>(&self, subject: &str, operation: F) -> Result<WriteResponse, EntityFailure>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CatalogResult<WriteResponse>>,
    {
        if self.cancel.is_cancelled() {
            return Err(EntityFailure::Cancelled);
        }

        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(EntityFailure::Cancelled),
            permit = self.limiter.acquire() => permit.map_err(|_| EntityFailure::Cancelled)?,
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(EntityFailure::Cancelled),
            result = with_retry(&self.options.config.retry, subject, operation) => {
                result.map_err(EntityFailure::from)
            }
        }
    }
}
