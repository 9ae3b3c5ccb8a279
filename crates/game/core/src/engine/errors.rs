//! Error types for the run pipeline.

use crate::command::SequenceError;
use crate::error::{ErrorSeverity, GameError};
use crate::grid::GridError;

/// Errors surfaced while starting or advancing a run.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RunError {
    #[error("session exhausted: {lives} lives and {iterations} iterations left")]
    SessionExhausted { lives: u32, iterations: u32 },

    #[error(transparent)]
    InvalidSequence(#[from] SequenceError),

    #[error("grid update failed: {0}")]
    Grid(#[from] GridError),
}

impl GameError for RunError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RunError::SessionExhausted { .. } => ErrorSeverity::Recoverable,
            RunError::InvalidSequence(err) => err.severity(),
            RunError::Grid(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RunError::SessionExhausted { .. } => "SESSION_EXHAUSTED",
            RunError::InvalidSequence(err) => err.error_code(),
            RunError::Grid(err) => err.error_code(),
        }
    }
}
