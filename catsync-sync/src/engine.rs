//! Category sync engine.
//!
//! Drafts are synced level by level so a parent always exists in the target
//! before its children are written. Within a level, drafts sharing a key run
//! sequentially in one task; distinct keys run concurrently, bounded by the
//! executor's semaphore.

use crate::client::CatalogClient;
use crate::config::SyncOptions;
use crate::diff::{TargetIndex, decide};
use crate::error::{EntityFailure, SyncResult};
use crate::executor::SyncExecutor;
use crate::outcome::Outcome;
use crate::rewrite::{PortableDraft, RejectedCategory};
use crate::stats::StatisticsAggregator;
use catsync_types::{Category, CategoryDraft, Key};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Syncs portable drafts into a target project and records every outcome.
pub struct CategorySync {
    executor: SyncExecutor,
    statistics: Arc<StatisticsAggregator>,
}

impl CategorySync {
    pub fn new(
        target: Arc<dyn CatalogClient>,
        options: SyncOptions,
        statistics: Arc<StatisticsAggregator>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            executor: SyncExecutor::new(target, options, cancel),
            statistics,
        }
    }

    pub fn statistics(&self) -> &Arc<StatisticsAggregator> {
        &self.statistics
    }

    /// Records a `Warned` outcome for every category the rewriter rejected.
    pub fn record_rejections(&self, rejected: &[RejectedCategory]) -> SyncResult<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(rejected.len());
        for category in rejected {
            let message = format!(
                "Category '{}' was skipped: its references could not be resolved.",
                category.label
            );
            let outcome = self
                .executor
                .warn(&category.label, &message, category.error.to_string());
            self.statistics.record(&outcome)?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Syncs every draft and returns one outcome per draft.
    ///
    /// Fails only when an outcome cannot be recorded; per-category failures
    /// are reported as outcomes.
    pub async fn sync(
        &self,
        drafts: Vec<PortableDraft>,
        index: Arc<TargetIndex>,
    ) -> SyncResult<Vec<Outcome>> {
        let total = drafts.len();
        let mut levels: BTreeMap<usize, Vec<CategoryDraft>> = BTreeMap::new();
        for portable in drafts {
            levels.entry(portable.depth).or_default().push(portable.draft);
        }

        // Categories written so far, newer than the index.
        let mut written: HashMap<Key, Category> = HashMap::new();
        let mut outcomes = Vec::with_capacity(total);

        for (depth, level) in levels {
            debug!("Syncing {} categories at depth {}", level.len(), depth);
            let level_outcomes = self.sync_level(level, &index, &mut written).await?;
            outcomes.extend(level_outcomes);
        }

        info!("Processed {} category drafts", outcomes.len());
        Ok(outcomes)
    }

    async fn sync_level(
        &self,
        level: Vec<CategoryDraft>,
        index: &Arc<TargetIndex>,
        written: &mut HashMap<Key, Category>,
    ) -> SyncResult<Vec<Outcome>> {
        let mut outcomes = Vec::with_capacity(level.len());
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<Key, usize> = HashMap::new();

        for (key, group) in group_by_key(level) {
            let existing = written
                .get(&key)
                .or_else(|| index.get(&key))
                .cloned();
            pending.insert(key.clone(), group.len());

            let executor = self.executor.clone();
            let index = Arc::clone(index);
            tasks.spawn(async move {
                let mut existing = existing;
                let mut results = Vec::with_capacity(group.len());
                for draft in &group {
                    let action = decide(draft, existing.as_ref(), index.lookup());
                    let (outcome, stored) = executor.apply(draft, action).await;
                    if stored.is_some() {
                        existing = stored;
                    }
                    results.push(outcome);
                }
                (key, existing, results)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, latest, results)) => {
                    pending.remove(&key);
                    if let Some(category) = latest {
                        written.insert(key, category);
                    }
                    for outcome in results {
                        self.statistics.record(&outcome)?;
                        outcomes.push(outcome);
                    }
                }
                Err(e) => error!("Category sync task failed: {}", e),
            }
        }

        // Drafts of a task that panicked still get an outcome.
        for (key, count) in pending {
            for _ in 0..count {
                let message = format!("Failed to sync category with key: '{key}'.");
                let failure = EntityFailure::Aborted("task ended unexpectedly".into());
                let outcome = self.executor.fail(key.as_str(), &message, failure);
                self.statistics.record(&outcome)?;
                outcomes.push(outcome);
            }
        }

        Ok(outcomes)
    }
}

/// Groups drafts by key, keeping first-seen key order and source order
/// within each group.
fn group_by_key(drafts: Vec<CategoryDraft>) -> Vec<(Key, Vec<CategoryDraft>)> {
    let mut groups: Vec<(Key, Vec<CategoryDraft>)> = Vec::new();
    let mut positions: HashMap<Key, usize> = HashMap::new();
    for draft in drafts {
        match positions.get(&draft.key) {
            Some(&pos) => groups[pos].1.push(draft),
            None => {
                positions.insert(draft.key.clone(), groups.len());
                groups.push((draft.key.clone(), vec![draft]));
            }
        }
    }
    groups
}
