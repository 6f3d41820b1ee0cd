//! Retry with exponential backoff for catalog writes.

use crate::error::{CatalogError, CatalogResult};
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::debug;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 200;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 10_000;

/// Maximum retries for a single write.
pub const MAX_RETRIES: usize = 3;

/// Configuration for retrying transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry (ms).
    pub min_delay_ms: u64,
    /// Upper bound for any single delay (ms).
    pub max_delay_ms: u64,
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: INITIAL_BACKOFF_MS,
            max_delay_ms: MAX_BACKOFF_MS,
            max_retries: MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// A configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Runs `operation`, retrying retryable [`CatalogError`]s with backoff.
///
/// A rate-limit response that carries a retry-after hint delays the next
/// attempt by at least that long. Non-retryable errors are returned at once;
/// after `max_retries` the last error is returned.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    subject: &str,
    mut operation: F,
) -> CatalogResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CatalogResult<T>>,
{
    let attempt = AtomicU32::new(0);
    let retry_after: Mutex<Option<Duration>> = Mutex::new(None);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        let hint = retry_after
            .lock()
            .map(|mut slot| slot.take())
            .unwrap_or_default();
        let call = operation();
        async move {
            if let Some(hint) = hint {
                tokio::time::sleep(hint).await;
            }
            call.await
        }
    };

    retry_op
        .retry(config.backoff())
        .when(CatalogError::is_retryable)
        .notify(|err: &CatalogError, dur: Duration| {
            if let Ok(mut slot) = retry_after.lock() {
                *slot = err.retry_after().filter(|hint| *hint > dur).map(|hint| hint - dur);
            }
            debug!(
                "Retrying {} in {:?} (attempt {}): {}",
                subject,
                dur,
                attempt.load(Ordering::SeqCst),
                err
            );
        })
        .await
}
