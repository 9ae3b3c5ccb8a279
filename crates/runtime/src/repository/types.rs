//! Records exchanged with the persistence collaborators.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ctman_core::SessionRecord;

/// Identifier of an authenticated user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque snapshot identifier assigned by the repository on save.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(String);

impl SnapshotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds an id from the save time and a per-repository sequence number.
    pub(crate) fn generate(saved_at: DateTime<Utc>, sequence: u64) -> Self {
        Self(format!("{}-{:04}", saved_at.timestamp_millis(), sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Listing entry for a saved snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub id: SnapshotId,
    pub name: String,
    pub saved_at: DateTime<Utc>,
}

/// A saved session, as stored.
///
/// The command queue is never part of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSnapshot {
    pub id: SnapshotId,
    pub user_id: UserId,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub record: SessionRecord,
}

impl SavedSnapshot {
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            saved_at: self.saved_at,
        }
    }
}

/// Reading progress of one user through one instructional module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleProgress {
    pub user_id: UserId,
    pub module_id: String,
    pub last_page_index: u32,
    pub last_access_time: DateTime<Utc>,
    /// Set the first time completion is reported, never cleared.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ModuleProgress {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Whether `key` can be used as a single path component.
pub(crate) fn is_safe_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && key != "."
        && key != ".."
}
