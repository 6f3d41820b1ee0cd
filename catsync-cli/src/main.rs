//! catsync command-line runner
//!
//! Copies the category tree of one commercetools project into another:
//! categories missing from the target are created, changed ones updated.
//!
//! Usage:
//!   catsync --source-project-key shop-eu --target-project-key shop-us
//!
//! Credentials are read from the `CTP_SOURCE_*` / `CTP_TARGET_*` environment
//! variables when not given as flags. Ctrl-C cancels the run.

use anyhow::{Result, bail};
use catsync_cli::Args;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!(
        "catsync starting: '{}' -> '{}'",
        args.source_project_key, args.target_project_key
    );
    let orchestrator = args.orchestrator()?;

    let cancel = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            cancel.cancel();
        }
    });

    let report = orchestrator.run().await;
    if let Some(json) = &report.report_json {
        println!("{json}");
    }

    if report.is_aborted() {
        match report.error {
            Some(error) => bail!("Sync aborted: {error}"),
            None => bail!("Sync aborted"),
        }
    }
    Ok(())
}
