//! File-backed repository implementations.

mod snapshot;

pub use snapshot::FileSnapshotRepository;
