//! Run orchestrator: sequences one sync run as an explicit state machine.
//!
//! ```text
//! INIT -> FETCHING_SOURCE -> FETCHING_TARGET -> SYNCING -> REPORTING -> DONE
//!              \                   \
//!               +-------------------+--> ABORTED
//! ```
//!
//! The orchestrator owns both client handles for the duration of the run and
//! closes them on every exit path.

use crate::client::CatalogClient;
use crate::config::SyncOptions;
use crate::diff::TargetIndex;
use crate::engine::CategorySync;
use crate::error::{SyncError, SyncResult};
use crate::fetch::fetch_all;
use crate::outcome::Outcome;
use crate::rewrite::rewrite_all;
use crate::stats::{RunStatistics, StatisticsAggregator};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// State of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Init,
    FetchingSource,
    FetchingTarget,
    Syncing,
    Reporting,
    Done,
    Aborted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

/// Final report of a run. Always produced, even when the run aborted.
#[derive(Debug)]
pub struct RunReport {
    /// Terminal state: `Done` or `Aborted`.
    pub state: RunState,
    pub statistics: RunStatistics,
    /// One outcome per source category that reached the sync phase.
    pub outcomes: Vec<Outcome>,
    /// The error that aborted the run.
    pub error: Option<SyncError>,
    /// Every state the run passed through, in order.
    pub transitions: Vec<RunState>,
    /// The statistics as a JSON document, unless serialization failed.
    pub report_json: Option<String>,
}

impl RunReport {
    pub fn is_aborted(&self) -> bool {
        self.state == RunState::Aborted
    }
}

/// Runs one source-to-target sync.
pub struct RunOrchestrator {
    source: Arc<dyn CatalogClient>,
    target: Arc<dyn CatalogClient>,
    options: SyncOptions,
    cancel: CancellationToken,
    timed_out: Arc<AtomicBool>,
    statistics: Arc<StatisticsAggregator>,
    transitions: Mutex<Vec<RunState>>,
}

impl RunOrchestrator {
    pub fn new(
        source: Arc<dyn CatalogClient>,
        target: Arc<dyn CatalogClient>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            target,
            options,
            cancel: CancellationToken::new(),
            timed_out: Arc::new(AtomicBool::new(false)),
            statistics: Arc::new(StatisticsAggregator::new()),
            transitions: Mutex::new(vec![RunState::Init]),
        }
    }

    /// Token that cancels the run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Live statistics, for progress reporting.
    pub fn statistics(&self) -> Arc<StatisticsAggregator> {
        Arc::clone(&self.statistics)
    }

    pub fn state(&self) -> RunState {
        self.lock_transitions()
            .last()
            .copied()
            .unwrap_or(RunState::Init)
    }

    fn lock_transitions(&self) -> std::sync::MutexGuard<'_, Vec<RunState>> {
        self.transitions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, next: RunState) {
        let mut transitions = self.lock_transitions();
        if let Some(current) = transitions.last() {
            info!("Run state {:?} -> {:?}", current, next);
        }
        transitions.push(next);
    }

    /// The error to report when the run stopped on its token.
    fn interruption(&self) -> SyncError {
        match self.options.config.timeout() {
            Some(limit) if self.timed_out.load(Ordering::SeqCst) => SyncError::Timeout(limit),
            _ => SyncError::Cancelled,
        }
    }

    /// Executes the run and returns its report. Both clients are closed
    /// before this returns.
    pub async fn run(&self) -> RunReport {
        if self.state() != RunState::Init {
            return RunReport {
                state: RunState::Aborted,
                statistics: self.statistics.snapshot(),
                outcomes: Vec::new(),
                error: Some(SyncError::Config("a run orchestrator can only run once".into())),
                transitions: self.lock_transitions().clone(),
                report_json: None,
            };
        }

        let timer = self.options.config.timeout().map(|limit| {
            let cancel = self.cancel.clone();
            let timed_out = Arc::clone(&self.timed_out);
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                timed_out.store(true, Ordering::SeqCst);
                cancel.cancel();
            })
        });

        let result = self.execute().await;

        if let Some(timer) = timer {
            timer.abort();
        }
        self.close_clients().await;

        match result {
            Ok(outcomes) => self.report(outcomes),
            Err(e) => self.abort(e),
        }
    }

    async fn execute(&self) -> SyncResult<Vec<Outcome>> {
        let config = &self.options.config;
        config.validate()?;

        self.transition(RunState::FetchingSource);
        let fetches = async {
            tokio::join!(
                fetch_all(self.source.as_ref(), config.page_size),
                fetch_all(self.target.as_ref(), config.page_size)
            )
        };
        let (source, target) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(self.interruption()),
            fetched = fetches => fetched,
        };
        let source = source?;
        self.transition(RunState::FetchingTarget);
        let target = target?;

        self.transition(RunState::Syncing);
        let rewritten = rewrite_all(&source.categories, &source.lookup);
        info!(
            "Rewrote {} source categories: {} drafts, {} rejected",
            source.len(),
            rewritten.drafts.len(),
            rewritten.rejected.len()
        );
        let index = Arc::new(TargetIndex::build(target));

        let sync = CategorySync::new(
            Arc::clone(&self.target),
            self.options.clone(),
            Arc::clone(&self.statistics),
            self.cancel.clone(),
        );
        let mut outcomes = sync.record_rejections(&rewritten.rejected)?;
        outcomes.extend(sync.sync(rewritten.drafts, index).await?);
        Ok(outcomes)
    }

    fn report(&self, outcomes: Vec<Outcome>) -> RunReport {
        self.transition(RunState::Reporting);
        let statistics = self.statistics.finalize();
        let report_json = self.serialize(&statistics);
        info!("{}", statistics.summary());
        info!(
            "Categories have been synced from project '{}' to project '{}'.",
            self.source.project_key(),
            self.target.project_key()
        );
        self.transition(RunState::Done);

        RunReport {
            state: RunState::Done,
            statistics,
            outcomes,
            error: None,
            transitions: self.lock_transitions().clone(),
            report_json,
        }
    }

    fn abort(&self, error: SyncError) -> RunReport {
        error!("Category sync aborted: {}", error);
        self.transition(RunState::Aborted);
        let statistics = self.statistics.finalize();
        let report_json = self.serialize(&statistics);
        info!("{}", statistics.summary());

        RunReport {
            state: RunState::Aborted,
            statistics,
            outcomes: Vec::new(),
            error: Some(error),
            transitions: self.lock_transitions().clone(),
            report_json,
        }
    }

    fn serialize(&self, statistics: &RunStatistics) -> Option<String> {
        match statistics.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                error!("Failed to serialize run statistics: {}", e);
                None
            }
        }
    }

    async fn close_clients(&self) {
        for client in [&self.source, &self.target] {
            if let Err(e) = client.close().await {
                warn!("Failed to close client for project '{}': {}", client.project_key(), e);
            }
        }
    }
}
