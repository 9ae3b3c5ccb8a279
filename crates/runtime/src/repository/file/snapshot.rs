//! File-based SnapshotRepository implementation.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;

use ctman_core::SessionRecord;

use crate::repository::types::is_safe_key;
use crate::repository::{
    RepositoryError, Result, SavedSnapshot, SnapshotId, SnapshotRepository, SnapshotSummary,
    UserId,
};

/// File-based implementation of SnapshotRepository.
///
/// # File Format
///
/// Each snapshot is stored as pretty-printed JSON at
/// `{base_dir}/{user_id}/{snapshot_id}.json`. Writes go to a `.json.tmp`
/// sibling first and are renamed into place.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
    sequence: AtomicU64,
}

impl FileSnapshotRepository {
    /// Create a repository rooted at `base_dir`, creating it if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self {
            base_dir,
            sequence: AtomicU64::new(0),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn user_dir(&self, user: &UserId) -> Result<PathBuf> {
        if !is_safe_key(user.as_str()) {
            return Err(RepositoryError::InvalidKey(user.to_string()));
        }
        Ok(self.base_dir.join(user.as_str()))
    }

    fn snapshot_path(&self, user: &UserId, id: &SnapshotId) -> Result<PathBuf> {
        if !is_safe_key(id.as_str()) {
            return Err(RepositoryError::InvalidKey(id.to_string()));
        }
        Ok(self.user_dir(user)?.join(format!("{id}.json")))
    }

    async fn read_snapshot(path: &Path) -> Result<Option<SavedSnapshot>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn list_snapshots(&self, user: &UserId) -> Result<Vec<SnapshotSummary>> {
        let dir = self.user_dir(user)?;
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let snapshot = match Self::read_snapshot(&path).await {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(
                        user = %user,
                        error = %err,
                        "Skipping unreadable snapshot {}",
                        path.display()
                    );
                    continue;
                }
            };

            // Only list what `load_snapshot` would hand back for this id.
            let stem = path.file_stem().and_then(|stem| stem.to_str());
            if &snapshot.user_id != user || stem != Some(snapshot.id.as_str()) {
                tracing::warn!(
                    user = %user,
                    owner = %snapshot.user_id,
                    "Skipping foreign snapshot {}",
                    path.display()
                );
                continue;
            }
            summaries.push(snapshot.summary());
        }

        summaries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at).then_with(|| b.id.cmp(&a.id)));
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

        let path = self.snapshot_path(user, &id)?;
        let temp_path = path.with_extension("json.tmp");
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let snapshot = SavedSnapshot {
            id: id.clone(),
            user_id: user.clone(),
            name: name.to_owned(),
            saved_at,
            record: record.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, &path).await?;

        tracing::debug!(user = %user, id = %id, "Saved snapshot to {}", path.display());

        Ok(id)
    }

    async fn load_snapshot(
        &self,
        user: &UserId,
        id: &SnapshotId,
    ) -> Result<Option<SavedSnapshot>> {
        let path = self.snapshot_path(user, id)?;
        let snapshot = Self::read_snapshot(&path).await?;

        tracing::debug!(
            user = %user,
            id = %id,
            found = snapshot.is_some(),
            "Loaded snapshot from {}",
            path.display()
        );

        // A file copied between user directories still belongs to its writer.
        Ok(snapshot.filter(|snapshot| &snapshot.user_id == user))
    }

    async fn delete_snapshot(&self, user: &UserId, id: &SnapshotId) -> Result<()> {
        let path = self.snapshot_path(user, id)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(user = %user, id = %id, "Deleted snapshot");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(RepositoryError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctman_core::{GameConfig, Grid, SessionState};
    use tempfile::TempDir;

    fn record() -> SessionRecord {
        SessionState::new(Grid::reference_maze(), &GameConfig::default())
            .unwrap()
            .to_record()
    }

    async fn setup() -> (TempDir, FileSnapshotRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileSnapshotRepository::new(temp_dir.path()).await.unwrap();
        (temp_dir, repo)
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_temp_dir, repo) = setup().await;
        let user = UserId::new("ada");

        let id = repo.save_snapshot(&user, "level one", &record()).await.unwrap();

        let path = repo.base_dir().join("ada").join(format!("{id}.json"));
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = repo.load_snapshot(&user, &id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "level one");
        assert_eq!(loaded.record, record());
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (_temp_dir, repo) = setup().await;
        let user = UserId::new("ada");

        let first = repo.save_snapshot(&user, "first", &record()).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.save_snapshot(&user, "second", &record()).await.unwrap();

        let listed = repo.list_snapshots(&user).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second);
        assert_eq!(listed[1].id, first);
    }

    #[tokio::test]
    async fn test_unknown_user_and_id() {
        let (_temp_dir, repo) = setup().await;
        let owner = UserId::new("ada");
        let other = UserId::new("grace");
        let id = repo.save_snapshot(&owner, "mine", &record()).await.unwrap();

        assert!(repo.list_snapshots(&other).await.unwrap().is_empty());
        assert!(repo.load_snapshot(&other, &id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_snapshot(&other, &id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_and_foreign_files() {
        let (_temp_dir, repo) = setup().await;
        let ada = UserId::new("ada");
        let grace = UserId::new("grace");

        let kept = repo.save_snapshot(&ada, "kept", &record()).await.unwrap();
        let foreign = repo.save_snapshot(&grace, "theirs", &record()).await.unwrap();

        let ada_dir = repo.base_dir().join("ada");
        std::fs::write(ada_dir.join("broken.json"), b"{ not json").unwrap();
        std::fs::copy(
            repo.base_dir().join("grace").join(format!("{foreign}.json")),
            ada_dir.join(format!("{foreign}.json")),
        )
        .unwrap();

        let listed = repo.list_snapshots(&ada).await.unwrap();
        let ids: Vec<&SnapshotId> = listed.iter().map(|summary| &summary.id).collect();
        assert_eq!(ids, vec![&kept]);
        assert!(repo.load_snapshot(&ada, &foreign).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let (_temp_dir, repo) = setup().await;

        let err = repo
            .list_snapshots(&UserId::new("../escape"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidKey(_)));

        let err = repo
            .load_snapshot(&UserId::new("ada"), &SnapshotId::new("../../x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, repo) = setup().await;
        let user = UserId::new("ada");
        let id = repo.save_snapshot(&user, "temp", &record()).await.unwrap();

        repo.delete_snapshot(&user, &id).await.unwrap();
        assert!(repo.list_snapshots(&user).await.unwrap().is_empty());
    }
}
