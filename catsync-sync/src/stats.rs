//! Run statistics.
//!
//! Counters are updated with atomics so worker tasks can record outcomes
//! concurrently. A read-write gate orders `record` against `finalize`: once
//! the statistics are frozen, every further `record` is an error instead of
//! a silently lost count.

use crate::error::{SyncError, SyncResult};
use crate::outcome::{Outcome, OutcomeKind};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

/// Aggregate counts of a run.
///
/// Serializes with a fixed field order: `created`, `updated`, `unchanged`,
/// `failed`, `warned`, `processingTimeMs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatistics {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub failed: u64,
    pub warned: u64,
    pub processing_time_ms: u64,
}

impl RunStatistics {
    /// Total number of categories with a recorded outcome.
    pub fn processed(&self) -> u64 {
        self.created + self.updated + self.unchanged + self.failed + self.warned
    }

    /// The report document as compact JSON.
    pub fn to_json(&self) -> SyncResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// A one-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Summary: {} categories were processed in total ({} created, {} updated, {} unchanged, {} failed to sync and {} warned) in {}ms.",
            self.processed(),
            self.created,
            self.updated,
            self.unchanged,
            self.failed,
            self.warned,
            self.processing_time_ms
        )
    }
}

/// Accumulates outcomes into [`RunStatistics`].
#[derive(Debug)]
pub struct StatisticsAggregator {
    created: AtomicU64,
    updated: AtomicU64,
    unchanged: AtomicU64,
    failed: AtomicU64,
    warned: AtomicU64,
    started: Instant,
    frozen: RwLock<Option<RunStatistics>>,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsAggregator {
    /// Starts an empty aggregator; processing time is measured from here.
    pub fn new() -> Self {
        Self {
            created: AtomicU64::new(0),
            updated: AtomicU64::new(0),
            unchanged: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            warned: AtomicU64::new(0),
            started: Instant::now(),
            frozen: RwLock::new(None),
        }
    }

    fn counter(&self, kind: OutcomeKind) -> &AtomicU64 {
        match kind {
            OutcomeKind::Created => &self.created,
            OutcomeKind::Updated => &self.updated,
            OutcomeKind::Unchanged => &self.unchanged,
            OutcomeKind::Failed => &self.failed,
            OutcomeKind::Warned => &self.warned,
        }
    }

    /// Counts one outcome. Fails once the statistics are finalized.
    pub fn record(&self, outcome: &Outcome) -> SyncResult<()> {
        let frozen = self
            .frozen
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if frozen.is_some() {
            return Err(SyncError::StatisticsFinalized);
        }
        self.counter(outcome.kind()).fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Counts a batch of outcomes.
    pub fn record_all<'a>(&self, outcomes: impl IntoIterator<Item = &'a Outcome>) -> SyncResult<()> {
        for outcome in outcomes {
            self.record(outcome)?;
        }
        Ok(())
    }

    fn read_counters(&self) -> RunStatistics {
        RunStatistics {
            created: self.created.load(Ordering::SeqCst),
            updated: self.updated.load(Ordering::SeqCst),
            unchanged: self.unchanged.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            warned: self.warned.load(Ordering::SeqCst),
            processing_time_ms: self.started.elapsed().as_millis() as u64,
        }
    }

    /// Current counts; after finalization, the frozen counts.
    pub fn snapshot(&self) -> RunStatistics {
        let frozen = self
            .frozen
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match *frozen {
            Some(stats) => stats,
            None => self.read_counters(),
        }
    }

    /// Freezes and returns the statistics. Calling it again returns the same
    /// frozen value.
    pub fn finalize(&self) -> RunStatistics {
        let mut frozen = self
            .frozen
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *frozen.get_or_insert_with(|| self.read_counters())
    }

    pub fn is_finalized(&self) -> bool {
        self.frozen
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_some()
    }
}
