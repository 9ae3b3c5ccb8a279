//! Learning-module progress tracking.
//!
//! Records how far the signed-in user has read through each instructional
//! module. The content itself is static and lives outside the runtime.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::api::{IdentityProvider, Result, RuntimeError};
use crate::repository::{ModuleProgress, ProgressRepository, RepositoryError, UserId};

/// Reads and updates progress for whoever the identity provider reports.
#[derive(Clone)]
pub struct ProgressTracker {
    repository: Arc<dyn ProgressRepository>,
    identity: Arc<dyn IdentityProvider>,
}

impl ProgressTracker {
    pub fn new(
        repository: Arc<dyn ProgressRepository>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            repository,
            identity,
        }
    }

    async fn current_user(&self) -> Result<UserId> {
        self.identity
            .current_user_id()
            .await
            .ok_or(RuntimeError::Repository(RepositoryError::Unauthenticated))
    }

    /// Records a visit to `page_index` of `module_id`.
    ///
    /// The page and access time are always refreshed. `completed_at` is set
    /// the first time `completed` is reported and kept afterwards.
    pub async fn update_progress(
        &self,
        module_id: &str,
        page_index: u32,
        completed: bool,
    ) -> Result<ModuleProgress> {
        let user = self.current_user().await?;
        let now = Utc::now();

        let existing = self.repository.get(&user, module_id).await?;
        let completed_at = match existing.and_then(|progress| progress.completed_at) {
            Some(at) => Some(at),
            None if completed => {
                info!(user = %user, module = module_id, "Module completed");
                Some(now)
            }
            None => None,
        };

        let progress = ModuleProgress {
            user_id: user,
            module_id: module_id.to_owned(),
            last_page_index: page_index,
            last_access_time: now,
            completed_at,
        };
        self.repository.upsert(progress.clone()).await?;

        debug!(
            module = module_id,
            page = page_index,
            completed = progress.is_completed(),
            "Progress updated"
        );
        Ok(progress)
    }

    /// Progress on one module, if the user has opened it.
    pub async fn module_progress(&self, module_id: &str) -> Result<Option<ModuleProgress>> {
        let user = self.current_user().await?;
        Ok(self.repository.get(&user, module_id).await?)
    }

    /// Every module the user has opened, ordered by module id.
    pub async fn all_progress(&self) -> Result<Vec<ModuleProgress>> {
        let user = self.current_user().await?;
        Ok(self.repository.list(&user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Anonymous, StaticIdentity};
    use crate::repository::InMemoryProgressRepo;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(
            Arc::new(InMemoryProgressRepo::new()),
            Arc::new(StaticIdentity::new("ada")),
        )
    }

    #[tokio::test]
    async fn test_first_visit_creates_record() {
        let tracker = tracker();
        assert!(tracker.module_progress("loops").await.unwrap().is_none());

        let progress = tracker.update_progress("loops", 2, false).await.unwrap();
        assert_eq!(progress.last_page_index, 2);
        assert!(!progress.is_completed());

        let stored = tracker.module_progress("loops").await.unwrap().unwrap();
        assert_eq!(stored, progress);
    }

    #[tokio::test]
    async fn test_completion_is_sticky() {
        let tracker = tracker();

        let done = tracker.update_progress("loops", 5, true).await.unwrap();
        let completed_at = done.completed_at.unwrap();

        let revisit = tracker.update_progress("loops", 1, false).await.unwrap();
        assert_eq!(revisit.completed_at, Some(completed_at));
        assert_eq!(revisit.last_page_index, 1);
        assert!(revisit.last_access_time >= done.last_access_time);

        let again = tracker.update_progress("loops", 5, true).await.unwrap();
        assert_eq!(again.completed_at, Some(completed_at));
    }

    #[tokio::test]
    async fn test_lists_only_own_modules() {
        let repository = Arc::new(InMemoryProgressRepo::new());
        let ada = ProgressTracker::new(repository.clone(), Arc::new(StaticIdentity::new("ada")));
        let grace =
            ProgressTracker::new(repository.clone(), Arc::new(StaticIdentity::new("grace")));

        ada.update_progress("variables", 0, false).await.unwrap();
        ada.update_progress("loops", 3, false).await.unwrap();
        grace.update_progress("loops", 1, true).await.unwrap();

        let modules: Vec<String> = ada
            .all_progress()
            .await
            .unwrap()
            .into_iter()
            .map(|progress| progress.module_id)
            .collect();
        assert_eq!(modules, vec!["loops", "variables"]);
        assert!(!ada.module_progress("loops").await.unwrap().unwrap().is_completed());
    }

    #[tokio::test]
    async fn test_requires_user() {
        let tracker = ProgressTracker::new(Arc::new(InMemoryProgressRepo::new()), Arc::new(Anonymous));
        let err = tracker.update_progress("loops", 0, false).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Repository(RepositoryError::Unauthenticated)
        ));
    }
}
