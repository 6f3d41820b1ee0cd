//! Argument handling for the `catsync` binary.

use anyhow::{Context, Result};
use catsync_ctp::{CtpClient, CtpConfig, DEFAULT_API_URL, DEFAULT_AUTH_URL};
use catsync_sync::{
    DEFAULT_CONCURRENCY, EntityFailure, MAX_PAGE_SIZE, RetryConfig, RunOrchestrator, SyncConfig,
    SyncOptions,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "catsync")]
#[command(about = "Sync categories from a source commercetools project to a target project")]
pub struct Args {
    /// Key of the project categories are read from
    #[arg(long, env = "CTP_SOURCE_PROJECT_KEY")]
    pub source_project_key: String,

    #[arg(long, env = "CTP_SOURCE_CLIENT_ID")]
    pub source_client_id: String,

    #[arg(long, env = "CTP_SOURCE_CLIENT_SECRET", hide_env_values = true)]
    pub source_client_secret: String,

    /// Key of the project categories are written to
    #[arg(long, env = "CTP_TARGET_PROJECT_KEY")]
    pub target_project_key: String,

    #[arg(long, env = "CTP_TARGET_CLIENT_ID")]
    pub target_client_id: String,

    #[arg(long, env = "CTP_TARGET_CLIENT_SECRET", hide_env_values = true)]
    pub target_client_secret: String,

    /// HTTP API host shared by both projects
    #[arg(long, env = "CTP_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// OAuth host shared by both projects
    #[arg(long, env = "CTP_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,

    /// Categories per listing page (1-500)
    #[arg(long, default_value_t = MAX_PAGE_SIZE)]
    pub page_size: u32,

    /// Maximum target writes in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Abort the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Retries for a transient write failure
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn source_config(&self) -> CtpConfig {
        self.project_config(
            &self.source_project_key,
            &self.source_client_id,
            &self.source_client_secret,
        )
    }

    pub fn target_config(&self) -> CtpConfig {
        self.project_config(
            &self.target_project_key,
            &self.target_client_id,
            &self.target_client_secret,
        )
    }

    fn project_config(&self, project: &str, client_id: &str, secret: &str) -> CtpConfig {
        CtpConfig {
            api_url: self.api_url.clone(),
            auth_url: self.auth_url.clone(),
            ..CtpConfig::new(project, client_id, secret)
        }
    }

    pub fn sync_config(&self) -> SyncConfig {
        let mut retry = RetryConfig::default();
        if let Some(max_retries) = self.max_retries {
            retry.max_retries = max_retries;
        }
        SyncConfig {
            page_size: self.page_size,
            concurrency: self.concurrency,
            timeout_ms: self
                .timeout_secs
                .map(|secs| Duration::from_secs(secs).as_millis() as u64),
            retry,
        }
    }

    /// Validates the arguments and builds a ready-to-run orchestrator.
    pub fn orchestrator(&self) -> Result<RunOrchestrator> {
        let config = self.sync_config();
        config.validate().context("Invalid sync settings")?;

        let source = CtpClient::new(self.source_config())
            .with_context(|| format!("Invalid source project '{}'", self.source_project_key))?;
        let target = CtpClient::new(self.target_config())
            .with_context(|| format!("Invalid target project '{}'", self.target_project_key))?;

        let options = SyncOptions::builder()
            .config(config)
            .error_callback(|message: &str, cause: &EntityFailure| {
                error!("{} Cause: {}", message, cause)
            })
            .warning_callback(|message: &str, context: &str| {
                warn!("{} Details: {}", message, context)
            })
            .build();
        Ok(RunOrchestrator::new(Arc::new(source), Arc::new(target), options))
    }
}
