//! Runtime orchestration for the command-sequence puzzle.
//!
//! This crate wires the deterministic engine from `ctman-core` to a paced,
//! asynchronous session worker, the persistence and identity collaborators,
//! and a topic event bus. Consumers embed [`Runtime`] and interact with the
//! session through [`SessionHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] provides snapshot and progress storage adapters
//! - [`progress`] tracks learning-module reading progress
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod config;
pub mod events;
pub mod progress;
pub mod repository;
pub mod runtime;

mod workers;

pub use api::{
    Anonymous, IdentityProvider, LoadTarget, Result, RunStream, RuntimeError, SessionHandle,
    StaticIdentity, StepSnapshot,
};
pub use config::RuntimeConfig;
pub use events::{Event, EventBus, PersistenceEvent, RunEvent, Topic};
pub use progress::ProgressTracker;
pub use repository::{
    FileSnapshotRepository, InMemoryProgressRepo, InMemorySnapshotRepo, ModuleProgress,
    ProgressRepository, RepositoryError, SavedSnapshot, SnapshotId, SnapshotRepository,
    SnapshotSummary, UserId,
};
pub use runtime::{Runtime, RuntimeBuilder};
