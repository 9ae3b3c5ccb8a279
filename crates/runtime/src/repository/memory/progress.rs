//! In-memory ProgressRepository implementation.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::repository::{ModuleProgress, ProgressRepository, RepositoryError, Result, UserId};

/// Progress records keyed by `(user, module)`.
#[derive(Default)]
pub struct InMemoryProgressRepo {
    records: RwLock<BTreeMap<(UserId, String), ModuleProgress>>,
}

impl InMemoryProgressRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressRepository for InMemoryProgressRepo {
    async fn get(&self, user: &UserId, module_id: &str) -> Result<Option<ModuleProgress>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records.get(&(user.clone(), module_id.to_owned())).cloned())
    }

    async fn upsert(&self, progress: ModuleProgress) -> Result<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let key = (progress.user_id.clone(), progress.module_id.clone());
        records.insert(key, progress);
        Ok(())
    }

    async fn list(&self, user: &UserId) -> Result<Vec<ModuleProgress>> {
        let records = self
            .records
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(records
            .values()
            .filter(|progress| &progress.user_id == user)
            .cloned()
            .collect())
    }
}
