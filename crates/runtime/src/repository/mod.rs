//! Repository layer for data that outlives a session.
//!
//! Repositories handle data the player keeps between visits:
//! - Named session snapshots (save/load)
//! - Learning-module reading progress
//!
//! The puzzle state itself lives in the session worker, not here.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::{InMemoryProgressRepo, InMemorySnapshotRepo};
pub use traits::{ProgressRepository, SnapshotRepository};
pub use types::{ModuleProgress, SavedSnapshot, SnapshotId, SnapshotSummary, UserId};
