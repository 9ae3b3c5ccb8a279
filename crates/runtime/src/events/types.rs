//! Event types for different topics.

use serde::{Deserialize, Serialize};

use ctman_core::{Command, Position, RunReport, Step};

use crate::repository::SnapshotId;

/// Events emitted over the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    /// A run passed validation and is about to take its first step.
    Started {
        commands: Vec<Command>,
        player: Position,
        score: u32,
    },

    /// One move was applied.
    Stepped { step: Step },

    /// The run ended on its own and bookkeeping was applied.
    Finished { report: RunReport },

    /// The run was stopped by the player; no bookkeeping was applied.
    Aborted { report: RunReport },
}

/// Events related to saving and replacing session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistenceEvent {
    Saved { id: SnapshotId, name: String },
    Loaded { id: SnapshotId },
    Deleted { id: SnapshotId },
    /// The session went back to the initial map.
    Reset,
}
