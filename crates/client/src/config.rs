//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;

use ctman_runtime::RuntimeConfig;

/// Everything the binary needs before it can build a runtime.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub runtime: RuntimeConfig,
    /// Signed-in user; without one, persistence commands are refused.
    pub user_id: Option<String>,
    /// Enables the rolling log file when set.
    pub log_dir: Option<PathBuf>,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CTMAN_USER_ID` - User owning the saves (default: anonymous)
    /// - `CTMAN_LOG_DIR` - Directory for daily log files (default: stderr only)
    /// - every variable read by [`RuntimeConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            runtime: RuntimeConfig::from_env(),
            user_id: env::var("CTMAN_USER_ID")
                .ok()
                .map(|id| id.trim().to_owned())
                .filter(|id| !id.is_empty()),
            log_dir: env::var("CTMAN_LOG_DIR").ok().map(PathBuf::from),
        }
    }

    /// Snapshot directory: `CTMAN_SAVE_DIR` or the platform data directory.
    pub fn save_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.runtime.save_dir {
            return Ok(dir.clone());
        }

        let dirs = ProjectDirs::from("", "", "ctman")
            .context("could not determine a home directory for save data")?;
        Ok(dirs.data_dir().join("saves"))
    }
}
