//! Repository contracts for the external persistence collaborators.
//!
//! Every call takes the user explicitly. Callers resolve the current user once
//! (see [`crate::api::IdentityProvider`]) and thread it through.

use async_trait::async_trait;

use ctman_core::SessionRecord;

use super::error::Result;
use super::types::{ModuleProgress, SavedSnapshot, SnapshotId, SnapshotSummary, UserId};

/// Named save slots for puzzle sessions.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Snapshots owned by `user`, newest first.
    async fn list_snapshots(&self, user: &UserId) -> Result<Vec<SnapshotSummary>>;

    /// Stores `record` under `name` and returns the assigned id.
    async fn save_snapshot(
        &self,
        user: &UserId,
        name: &str,
        record: &SessionRecord,
    ) -> Result<SnapshotId>;

    /// Returns `None` when the id is unknown or belongs to another user.
    async fn load_snapshot(&self, user: &UserId, id: &SnapshotId)
    -> Result<Option<SavedSnapshot>>;

    /// Fails with [`super::RepositoryError::NotFound`] when `user` owns no such snapshot.
    async fn delete_snapshot(&self, user: &UserId, id: &SnapshotId) -> Result<()>;
}

/// Per-user module reading progress, keyed by `(user, module)`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn get(&self, user: &UserId, module_id: &str) -> Result<Option<ModuleProgress>>;

    /// Inserts or replaces the record for its `(user_id, module_id)` pair.
    async fn upsert(&self, progress: ModuleProgress) -> Result<()>;

    /// All records of `user`, ordered by module id.
    async fn list(&self, user: &UserId) -> Result<Vec<ModuleProgress>>;
}
