//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the session, worker coordination, and repositories so
//! clients can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use ctman_core::{ErrorSeverity, GameError, SessionError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("session worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("failed to initialize session")]
    InitialState(#[source] SessionError),
}

impl RuntimeError {
    /// Whether the request was refused because a run is active.
    pub fn is_run_in_progress(&self) -> bool {
        matches!(self, RuntimeError::Session(SessionError::RunInProgress))
    }

    /// Player-fixable refusals; everything else is an infrastructure failure.
    pub fn is_recoverable(&self) -> bool {
        match self {
            RuntimeError::Session(err) => err.severity().is_recoverable(),
            RuntimeError::Repository(
                RepositoryError::NotFound(_) | RepositoryError::Unauthenticated,
            ) => true,
            _ => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Session(err) => err.severity(),
            RuntimeError::InitialState(err) => err.severity(),
            RuntimeError::Repository(
                RepositoryError::NotFound(_)
                | RepositoryError::Unauthenticated
                | RepositoryError::InvalidKey(_),
            ) => ErrorSeverity::Validation,
            _ => ErrorSeverity::Internal,
        }
    }
}
