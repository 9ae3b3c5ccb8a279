//! Deterministic puzzle engine for the command-sequence maze game.
//!
//! `ctman-core` defines the canonical rules (grid, command vocabulary, run
//! simulation, session bookkeeping) and exposes pure APIs with no I/O or
//! clock. All state mutation flows through [`engine::GameEngine`], and the
//! runtime crate depends on the types re-exported here.
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod session;
pub mod state;

pub use command::{
    Command, CommandQueue, Instruction, Program, QueueError, SequenceError, SequenceFault,
};
pub use config::{CollisionRecovery, CrossroadCheck, GameConfig};
pub use engine::{
    Collision, CollisionKind, GameEngine, Run, RunError, RunOutcome, RunPhase, RunReport, Step,
    StepOutcome,
};
pub use error::{ErrorSeverity, GameError};
pub use grid::{Cell, Direction, Grid, GridError, Position};
pub use session::{RunSteps, Session, SessionError, SessionPhase};
pub use state::{InvariantError, SessionRecord, SessionState};
