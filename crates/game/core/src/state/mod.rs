//! Canonical puzzle session state.
//!
//! [`SessionState`] aggregates the grid, entity positions, counters, and the
//! command queue. [`SessionRecord`] is the persisted subset: everything except
//! the queue, which is always empty after a load.

use crate::command::CommandQueue;
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};
use crate::grid::{Cell, Grid, Position};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("grid has no player cell")]
    MissingPlayer,

    #[error("grid has {count} player cells, expected exactly one")]
    MultiplePlayers { count: usize },

    #[error("player tracked at {tracked} but the grid shows it at {found}")]
    PlayerDesync { tracked: Position, found: Position },

    #[error("ghost positions {tracked:?} do not match the grid {found:?}")]
    GhostDesync {
        tracked: Vec<Position>,
        found: Vec<Position>,
    },

    /// Collisions may reset the player to `start`, so it must be a cell the
    /// player can stand on without displacing anything.
    #[error("session start {start} is not an open cell ({cell:?})")]
    InvalidStart { start: Position, cell: Option<Cell> },
}

impl GameError for InvariantError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            InvariantError::MissingPlayer
            | InvariantError::MultiplePlayers { .. }
            | InvariantError::InvalidStart { .. } => ErrorSeverity::Validation,
            InvariantError::PlayerDesync { .. } | InvariantError::GhostDesync { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            InvariantError::MissingPlayer => "MISSING_PLAYER",
            InvariantError::MultiplePlayers { .. } => "MULTIPLE_PLAYERS",
            InvariantError::PlayerDesync { .. } => "PLAYER_DESYNC",
            InvariantError::GhostDesync { .. } => "GHOST_DESYNC",
            InvariantError::InvalidStart { .. } => "INVALID_START",
        }
    }
}

/// Live state of one puzzle session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionState {
    pub grid: Grid,
    pub player: Position,
    pub ghosts: Vec<Position>,
    /// Where the player stood when the session started or was loaded.
    pub start: Position,
    pub lives: u32,
    pub score: u32,
    pub iterations: u32,
    pub commands: CommandQueue,
}

impl SessionState {
    /// Fresh session on `grid` with the configured starting budget.
    pub fn new(grid: Grid, config: &GameConfig) -> Result<Self, InvariantError> {
        let player = locate_player(&grid)?;
        let ghosts = grid.positions_of(Cell::Ghost).collect();

        Ok(Self {
            grid,
            player,
            ghosts,
            start: player,
            lives: config.starting_lives,
            score: 0,
            iterations: config.starting_iterations,
            commands: CommandQueue::new(),
        })
    }

    /// Rebuilds a session from a persisted record with an empty queue.
    ///
    /// The record's start position becomes the new session start.
    pub fn from_record(record: SessionRecord) -> Result<Self, InvariantError> {
        let state = Self {
            grid: record.grid,
            player: record.player,
            ghosts: record.ghosts,
            start: record.start,
            lives: record.lives,
            score: record.score,
            iterations: record.iterations,
            commands: CommandQueue::new(),
        };
        state.check_invariants()?;
        Ok(state)
    }

    /// Persistable copy of everything but the command queue.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            grid: self.grid.clone(),
            player: self.player,
            ghosts: self.ghosts.clone(),
            start: self.start,
            lives: self.lives,
            score: self.score,
            iterations: self.iterations,
        }
    }

    /// Whether a run may start: at least one life and one iteration left.
    pub fn has_budget(&self) -> bool {
        self.lives > 0 && self.iterations > 0
    }

    /// Verifies the grid and the tracked positions agree, and that the
    /// session start is the player's cell or an empty one.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let found = locate_player(&self.grid)?;
        if found != self.player {
            return Err(InvariantError::PlayerDesync {
                tracked: self.player,
                found,
            });
        }

        let ghosts: Vec<Position> = self.grid.positions_of(Cell::Ghost).collect();
        let mut tracked = self.ghosts.clone();
        tracked.sort_unstable_by_key(|position| (position.y, position.x));
        if tracked != ghosts {
            return Err(InvariantError::GhostDesync {
                tracked: self.ghosts.clone(),
                found: ghosts,
            });
        }

        let cell = self.grid.get(self.start);
        let start_is_open = match cell {
            Some(Cell::Player) => self.start == self.player,
            Some(Cell::Empty) => true,
            _ => false,
        };
        if !start_is_open {
            return Err(InvariantError::InvalidStart {
                start: self.start,
                cell,
            });
        }

        Ok(())
    }
}

/// Persisted session snapshot payload. The command queue is never saved.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionRecord {
    pub grid: Grid,
    pub player: Position,
    pub ghosts: Vec<Position>,
    pub start: Position,
    pub lives: u32,
    pub score: u32,
    pub iterations: u32,
}

fn locate_player(grid: &Grid) -> Result<Position, InvariantError> {
    let mut players = grid.positions_of(Cell::Player);
    let first = players.next().ok_or(InvariantError::MissingPlayer)?;
    let extra = players.count();
    if extra > 0 {
        return Err(InvariantError::MultiplePlayers { count: extra + 1 });
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn new_session_scans_entities() {
        let state = SessionState::new(Grid::reference_maze(), &GameConfig::default()).unwrap();
        assert_eq!(state.player, Position::new(5, 5));
        assert_eq!(state.start, Position::new(5, 5));
        assert_eq!(state.ghosts, vec![Position::new(1, 1), Position::new(9, 9)]);
        assert_eq!((state.lives, state.score, state.iterations), (3, 0, 20));
        assert!(state.commands.is_empty());
        state.check_invariants().unwrap();
    }

    #[test]
    fn rejects_grids_without_exactly_one_player() {
        let none = Grid::parse("#._#").unwrap();
        assert_eq!(
            SessionState::new(none, &GameConfig::default()).unwrap_err(),
            InvariantError::MissingPlayer
        );

        let two = Grid::parse("#PP#").unwrap();
        assert_eq!(
            SessionState::new(two, &GameConfig::default()).unwrap_err(),
            InvariantError::MultiplePlayers { count: 2 }
        );
    }

    #[test]
    fn record_drops_the_queue() {
        let mut state = SessionState::new(Grid::reference_maze(), &GameConfig::default()).unwrap();
        state.commands.push(Command::Left).unwrap();
        state.score = 40;

        let restored = SessionState::from_record(state.to_record()).unwrap();
        assert!(restored.commands.is_empty());
        assert_eq!(restored.score, 40);
        assert_eq!(restored.grid, state.grid);
    }

    #[test]
    fn detects_player_desync() {
        let mut state = SessionState::new(Grid::reference_maze(), &GameConfig::default()).unwrap();
        state.player = Position::new(4, 5);
        let err = state.check_invariants().unwrap_err();
        assert_eq!(err.severity(), ErrorSeverity::Fatal);
        assert!(SessionState::from_record(state.to_record()).is_err());
    }

    #[test]
    fn record_start_must_be_open() {
        let state = SessionState::new(Grid::reference_maze(), &GameConfig::default()).unwrap();

        let mut on_ghost = state.to_record();
        on_ghost.start = Position::new(1, 1);
        assert_eq!(
            SessionState::from_record(on_ghost).unwrap_err(),
            InvariantError::InvalidStart {
                start: Position::new(1, 1),
                cell: Some(Cell::Ghost),
            }
        );

        let mut outside = state.to_record();
        outside.start = Position::new(50, 50);
        let err = SessionState::from_record(outside).unwrap_err();
        assert!(matches!(err, InvariantError::InvalidStart { cell: None, .. }));
        assert_eq!(err.severity(), ErrorSeverity::Validation);

        let mut on_pellet = state.to_record();
        on_pellet.start = Position::new(4, 5);
        assert!(SessionState::from_record(on_pellet).is_err());

        let mut on_empty = state.to_record();
        on_empty.grid.set_cell_at(Position::new(4, 5), Cell::Empty).unwrap();
        on_empty.start = Position::new(4, 5);
        SessionState::from_record(on_empty).unwrap();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn record_serializes_grid_as_rows() {
        let state = SessionState::new(Grid::reference_maze(), &GameConfig::default()).unwrap();
        let json = serde_json::to_value(state.to_record()).unwrap();
        assert_eq!(json["grid"].as_array().map(Vec::len), Some(11));
        assert_eq!(json["grid"][5][5], "player");

        let back: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, state.to_record());
    }
}
