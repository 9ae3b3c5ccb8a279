//! Cloneable façade for issuing requests to the session worker.
//!
//! [`SessionHandle`] hides channel plumbing and offers async helpers for
//! editing the queue, running it, and saving or loading the session.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use ctman_core::{Command, RunReport, SessionState};

use super::errors::{Result, RuntimeError};
use super::providers::IdentityProvider;
use super::stream::RunStream;
use crate::events::{Event, EventBus, Topic};
use crate::repository::{RepositoryError, SnapshotId, SnapshotSummary, UserId};
use crate::workers::Request;

/// What `load` should replace the session with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadTarget {
    /// The initial map, positions, and budget.
    New,
    Snapshot(SnapshotId),
}

/// Client-facing handle to interact with one session
#[derive(Clone)]
pub struct SessionHandle {
    request_tx: mpsc::Sender<Request>,
    event_bus: EventBus,
    identity: Arc<dyn IdentityProvider>,
}

impl SessionHandle {
    pub(crate) fn new(
        request_tx: mpsc::Sender<Request>,
        event_bus: EventBus,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            request_tx,
            event_bus,
            identity,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.request_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Resolves the signed-in user for a persistence call.
    async fn current_user(&self) -> Result<UserId> {
        self.identity
            .current_user_id()
            .await
            .ok_or(RuntimeError::Repository(RepositoryError::Unauthenticated))
    }

    /// Append a command at the tail of the queue
    pub async fn append_command(&self, command: Command) -> Result<()> {
        self.request(|reply| Request::AppendCommand { command, reply })
            .await?
    }

    /// Remove the queued command at `index`
    pub async fn remove_command(&self, index: usize) -> Result<Command> {
        self.request(|reply| Request::RemoveCommand { index, reply })
            .await?
    }

    /// Start running the queue
    ///
    /// Returns once the run has passed validation. Steps then arrive on the
    /// returned [`RunStream`] at the configured pace.
    pub async fn run(&self) -> Result<RunStream> {
        self.request(|reply| Request::Run { reply }).await?
    }

    /// Stop the active run at the next step boundary
    ///
    /// No iteration or life is spent. Queue entries whose instruction had not
    /// started are kept.
    pub async fn abort(&self) -> Result<RunReport> {
        self.request(|reply| Request::Abort { reply }).await?
    }

    /// Query the current session state (read-only snapshot)
    pub async fn query_state(&self) -> Result<SessionState> {
        self.request(|reply| Request::QueryState { reply }).await
    }

    /// Save the current session under `name`
    pub async fn save(&self, name: impl Into<String>) -> Result<SnapshotId> {
        let user = self.current_user().await?;
        let name = name.into();
        self.request(|reply| Request::Save { user, name, reply })
            .await?
    }

    /// Replace the session wholesale
    ///
    /// `LoadTarget::New` does not touch storage and needs no signed-in user.
    pub async fn load(&self, target: LoadTarget) -> Result<()> {
        match target {
            LoadTarget::New => self.request(|reply| Request::Reset { reply }).await?,
            LoadTarget::Snapshot(id) => {
                let user = self.current_user().await?;
                self.request(|reply| Request::Load { user, id, reply })
                    .await?
            }
        }
    }

    /// Saved snapshots of the current user, newest first
    pub async fn list_saves(&self) -> Result<Vec<SnapshotSummary>> {
        let user = self.current_user().await?;
        self.request(|reply| Request::ListSaves { user, reply })
            .await?
    }

    /// Delete one of the current user's snapshots
    pub async fn delete_save(&self, id: SnapshotId) -> Result<()> {
        let user = self.current_user().await?;
        self.request(|reply| Request::DeleteSave { user, id, reply })
            .await?
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Run` - Run start, each step, finish, and abort
    /// - `Topic::Persistence` - Save, load, delete, and reset
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
