//! Command-line surface of the `ctman` binary.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ctman_core::Command;
use ctman_runtime::{LoadTarget, SnapshotId};

/// Steer the player through the maze with a queued command sequence
#[derive(Parser, Debug)]
#[command(name = "ctman")]
#[command(about = "Command-sequence maze puzzle", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Play on the maze in this text file instead of the reference maze
    #[arg(long, global = true, value_name = "PATH")]
    pub grid: Option<PathBuf>,

    /// Pause between steps in milliseconds (overrides CTMAN_STEP_INTERVAL_MS)
    #[arg(long, global = true, value_name = "MS")]
    pub interval: Option<u64>,

    #[command(subcommand)]
    pub command: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Queue commands and run them, printing every step
    Play {
        /// left|l, right|r, up|u, down|d, run-until-wall, run-until-crossroad
        #[arg(value_parser = parse_command, required = true, num_args = 1..)]
        commands: Vec<Command>,

        /// Start from a saved snapshot, or `new` for the initial maze
        #[arg(long, value_name = "ID", value_parser = parse_load_target)]
        load: Option<LoadTarget>,

        /// Save the session under this name after the run
        #[arg(long, value_name = "NAME")]
        save: Option<String>,
    },

    /// List saved snapshots, newest first
    Saves,

    /// Delete a saved snapshot
    Delete {
        /// Snapshot id as printed by `saves`
        id: String,
    },

    /// Print the maze and the starting budget
    Maze {
        /// Show a saved snapshot instead of the initial maze
        #[arg(long, value_name = "ID", value_parser = parse_load_target)]
        load: Option<LoadTarget>,
    },
}

fn parse_command(value: &str) -> Result<Command, String> {
    value.parse().map_err(|_| {
        format!(
            "unknown command `{value}` \
             (expected left, right, up, down, run-until-wall or run-until-crossroad)"
        )
    })
}

fn parse_load_target(value: &str) -> Result<LoadTarget, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("snapshot id must not be empty".to_owned());
    }
    if value.eq_ignore_ascii_case("new") {
        return Ok(LoadTarget::New);
    }
    Ok(LoadTarget::Snapshot(SnapshotId::new(value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_play_parses_commands_and_options() {
        let cli = Cli::try_parse_from([
            "ctman",
            "play",
            "r",
            "until-wall",
            "down",
            "--load",
            "NEW",
            "--save",
            "corner",
            "--interval",
            "0",
        ])
        .unwrap();

        assert_eq!(cli.interval, Some(0));
        match cli.command {
            Action::Play {
                commands,
                load,
                save,
            } => {
                assert_eq!(
                    commands,
                    vec![Command::Right, Command::RunUntilWall, Command::Down]
                );
                assert_eq!(load, Some(LoadTarget::New));
                assert_eq!(save.as_deref(), Some("corner"));
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_command() {
        let err = Cli::try_parse_from(["ctman", "play", "jump"]).unwrap_err();
        assert!(err.to_string().contains("unknown command `jump`"));
    }

    #[test]
    fn test_play_requires_commands() {
        assert!(Cli::try_parse_from(["ctman", "play"]).is_err());
    }

    #[test]
    fn test_load_target_snapshot_id() {
        assert_eq!(
            parse_load_target("1700000000000-0001"),
            Ok(LoadTarget::Snapshot(SnapshotId::new("1700000000000-0001")))
        );
        assert!(parse_load_target("  ").is_err());
    }
}
