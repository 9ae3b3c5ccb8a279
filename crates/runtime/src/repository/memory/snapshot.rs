//! In-memory SnapshotRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use ctman_core::SessionRecord;

use crate::repository::{
    RepositoryError, Result, SavedSnapshot, SnapshotId, SnapshotRepository, SnapshotSummary,
    UserId,
};

/// In-memory implementation of SnapshotRepository.
///
/// Snapshots are kept per user in save order.
#[derive(Default)]
pub struct InMemorySnapshotRepo {
    snapshots: RwLock<HashMap<UserId, Vec<SavedSnapshot>>>,
    sequence: AtomicU64,
}

impl InMemorySnapshotRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepo {
    async fn list_snapshots(&self, user: &UserId) -> Result<Vec<SnapshotSummary>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;

        let mut summaries: Vec<SnapshotSummary> = snapshots
            .get(user)
            .map(|saved| saved.iter().rev().map(SavedSnapshot::summary).collect())
            .unwrap_or_default();
        // Stable sort keeps later saves first within the same instant.
        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(summaries)
    }

    async fn save_snapshot(
        &self,
        user: &UserId,
        name: &str,
        record: &SessionRecord,
    ) -> Result<SnapshotId> {
        let saved_at = Utc::now();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let id = SnapshotId::generate(saved_at, sequence);

        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots
            .entry(user.clone())
            .or_default()
            .push(SavedSnapshot {
                id: id.clone(),
                user_id: user.clone(),
                name: name.to_owned(),
                saved_at,
                record: record.clone(),
            });
        Ok(id)
    }

    async fn load_snapshot(
        &self,
        user: &UserId,
        id: &SnapshotId,
    ) -> Result<Option<SavedSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots
            .get(user)
            .and_then(|saved| saved.iter().find(|snapshot| &snapshot.id == id))
            .cloned())
    }

    async fn delete_snapshot(&self, user: &UserId, id: &SnapshotId) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let saved = snapshots
            .get_mut(user)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        let index = saved
            .iter()
            .position(|snapshot| &snapshot.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        saved.remove(index);
        Ok(())
    }
}
