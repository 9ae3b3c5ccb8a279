//! Runtime configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ctman_core::{CollisionRecovery, CrossroadCheck, GameConfig};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub game: GameConfig,
    /// Pause between two steps of a run. Zero runs without pacing.
    pub step_interval: Duration,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Where file-backed snapshots live; `None` leaves the choice to the client.
    pub save_dir: Option<PathBuf>,
}

impl RuntimeConfig {
    pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(500);

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `CTMAN_STEP_INTERVAL_MS` - Pause between run steps (default: 500)
    /// - `CTMAN_COMMAND_BUFFER` - Request queue size (default: 32)
    /// - `CTMAN_EVENT_BUFFER` - Per-topic event capacity (default: 100)
    /// - `CTMAN_SAVE_DIR` - Snapshot directory (default: client decides)
    /// - `CTMAN_COLLISION_RESET` - `session-start`, `run-start`, or `stay`
    /// - `CTMAN_CROSSROAD_CHECK` - `landing` or `lookahead`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] over an arbitrary key source.
    ///
    /// Unparsable values are ignored and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(millis) = parse::<u64>(lookup("CTMAN_STEP_INTERVAL_MS")) {
            config.step_interval = Duration::from_millis(millis);
        }
        if let Some(capacity) = parse::<usize>(lookup("CTMAN_COMMAND_BUFFER")) {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = parse::<usize>(lookup("CTMAN_EVENT_BUFFER")) {
            config.event_buffer_size = capacity.max(1);
        }
        config.save_dir = lookup("CTMAN_SAVE_DIR").map(PathBuf::from);

        if let Some(recovery) = parse::<CollisionRecovery>(lookup("CTMAN_COLLISION_RESET")) {
            config.game.collision_recovery = recovery;
        }
        if let Some(check) = parse::<CrossroadCheck>(lookup("CTMAN_CROSSROAD_CHECK")) {
            config.game.crossroad_check = check;
        }

        config
    }

    pub fn with_step_interval(mut self, interval: Duration) -> Self {
        self.step_interval = interval;
        self
    }

    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            step_interval: Self::DEFAULT_STEP_INTERVAL,
            command_buffer_size: 32,
            event_buffer_size: 100,
            save_dir: None,
        }
    }
}

fn parse<T: FromStr>(value: Option<String>) -> Option<T> {
    value?.trim().parse().ok()
}
