//! Run configuration and injected callbacks.

use crate::client::MAX_PAGE_SIZE;
use crate::error::{EntityFailure, SyncError, SyncResult};
use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Default number of concurrent target writes.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Configuration for one sync run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Categories per page when listing a project.
    pub page_size: u32,
    /// Maximum target writes in flight at once.
    pub concurrency: usize,
    /// Run-level timeout (ms); `None` means no timeout.
    pub timeout_ms: Option<u64>,
    /// Retry policy for transient write failures.
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: None,
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Checks that every value is usable.
    pub fn validate(&self) -> SyncResult<()> {
        crate::fetch::validate_page_size(self.page_size)?;
        if self.concurrency == 0 {
            return Err(SyncError::Config("concurrency must be at least 1".into()));
        }
        if self.timeout_ms == Some(0) {
            return Err(SyncError::Config("timeout must be greater than zero".into()));
        }
        if self.retry.min_delay_ms > self.retry.max_delay_ms {
            return Err(SyncError::Config(format!(
                "retry min delay ({}ms) exceeds max delay ({}ms)",
                self.retry.min_delay_ms, self.retry.max_delay_ms
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Invoked once per failed category: `(message, cause)`.
pub type ErrorCallback = Arc<dyn Fn(&str, &EntityFailure) + Send + Sync>;

/// Invoked once per warned category: `(message, context)`.
pub type WarningCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Configuration plus the callbacks the executor reports through.
#[derive(Clone)]
pub struct SyncOptions {
    pub config: SyncConfig,
    error_callback: ErrorCallback,
    warning_callback: WarningCallback,
}

impl SyncOptions {
    pub fn builder() -> SyncOptionsBuilder {
        SyncOptionsBuilder::default()
    }

    pub fn report_error(&self, message: &str, cause: &EntityFailure) {
        (self.error_callback)(message, cause);
    }

    pub fn report_warning(&self, message: &str, context: &str) {
        (self.warning_callback)(message, context);
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for SyncOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncOptions")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SyncOptions`]. Callbacks default to logging.
#[derive(Default)]
pub struct SyncOptionsBuilder {
    config: SyncConfig,
    error_callback: Option<ErrorCallback>,
    warning_callback: Option<WarningCallback>,
}

impl SyncOptionsBuilder {
    #[must_use]
    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = retry;
        self
    }

    #[must_use]
    pub fn error_callback(
        mut self,
        callback: impl Fn(&str, &EntityFailure) + Send + Sync + 'static,
    ) -> Self {
        self.error_callback = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn warning_callback(mut self, callback: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.warning_callback = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> SyncOptions {
        let error_callback: ErrorCallback = match self.error_callback {
            Some(callback) => callback,
            None => Arc::new(|message: &str, cause: &EntityFailure| {
                error!("{}: {}", message, cause)
            }),
        };
        let warning_callback: WarningCallback = match self.warning_callback {
            Some(callback) => callback,
            None => Arc::new(|message: &str, context: &str| warn!("{} ({})", message, context)),
        };

        SyncOptions {
            config: self.config,
            error_callback,
            warning_callback,
        }
    }
}
