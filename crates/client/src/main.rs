//! `ctman` entry point.
//!
//! Loads configuration from the environment (and `.env`), sets up logging,
//! wires the runtime to file-backed snapshots, and runs one CLI action.
mod app;
mod cli;
mod config;
mod logging;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ctman_core::Grid;
use ctman_runtime::{Anonymous, FileSnapshotRepository, Runtime, StaticIdentity};

use app::App;
use cli::Cli;
use config::ClientConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(millis) = cli.interval {
        config.runtime.step_interval = Duration::from_millis(millis);
    }

    let _log_guard = logging::setup_logging(config.log_dir.as_deref())?;

    let save_dir = config.save_dir()?;
    let snapshots = FileSnapshotRepository::new(&save_dir)
        .await
        .with_context(|| format!("cannot open save directory {}", save_dir.display()))?;
    tracing::debug!(dir = %save_dir.display(), "Snapshot storage ready");

    let mut builder = Runtime::builder()
        .config(config.runtime.clone())
        .snapshots(snapshots);

    if let Some(path) = &cli.grid {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("cannot read maze {}", path.display()))?;
        let grid = Grid::parse(&text).with_context(|| format!("invalid maze {}", path.display()))?;
        builder = builder.grid(grid);
    }

    builder = match config.user_id {
        Some(user) => builder.identity(StaticIdentity::new(user)),
        None => builder.identity(Anonymous),
    };

    let runtime = builder.build().await?;
    App::new(runtime).execute(cli.command).await
}
