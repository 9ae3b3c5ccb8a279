//! In-memory repository implementations.

mod progress;
mod snapshot;

pub use progress::InMemoryProgressRepo;
pub use snapshot::InMemorySnapshotRepo;
