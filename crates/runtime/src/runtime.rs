//! High-level runtime orchestrator.
//!
//! The runtime owns the session worker, wires up request/event channels, and
//! exposes a builder-based API for clients to drive a puzzle session.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use ctman_core::{Grid, Session};

use crate::api::{Anonymous, IdentityProvider, Result, RuntimeError, SessionHandle};
use crate::config::RuntimeConfig;
use crate::events::{Event, EventBus, Topic};
use crate::progress::ProgressTracker;
use crate::repository::{
    InMemoryProgressRepo, InMemorySnapshotRepo, ProgressRepository, SnapshotRepository,
};
use crate::workers::{Request, SessionWorker};

/// Main runtime that orchestrates one puzzle session
///
/// Design: Runtime owns the worker and coordinates shutdown.
/// [`SessionHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: SessionHandle,
    progress: ProgressTracker,
    config: RuntimeConfig,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to the session
    ///
    /// The handle can be shared across clients and async tasks.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Learning-progress tracker bound to the same identity provider
    pub fn progress(&self) -> ProgressTracker {
        self.progress.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Subscribe to session events on one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Shutdown the runtime gracefully
    ///
    /// Waits for the worker, which stops once every handle has been dropped.
    /// A run still in progress is played out without pacing first.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        drop(self.progress);

        self.worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        tracing::debug!("Runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    grid: Option<Grid>,
    snapshots: Option<Arc<dyn SnapshotRepository>>,
    progress: Option<Arc<dyn ProgressRepository>>,
    identity: Option<Arc<dyn IdentityProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            grid: None,
            snapshots: None,
            progress: None,
            identity: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Play on `grid` instead of the reference maze
    pub fn grid(mut self, grid: Grid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Snapshot storage (default: in-memory)
    pub fn snapshots(mut self, repository: impl SnapshotRepository + 'static) -> Self {
        self.snapshots = Some(Arc::new(repository));
        self
    }

    /// Progress storage (default: in-memory)
    pub fn progress(mut self, repository: impl ProgressRepository + 'static) -> Self {
        self.progress = Some(Arc::new(repository));
        self
    }

    /// Identity source for persistence calls (default: [`Anonymous`])
    pub fn identity(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Some(Arc::new(identity));
        self
    }

    /// Build the runtime and spawn its worker
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let grid = self.grid.unwrap_or_else(Grid::reference_maze);
        let session = Session::with_grid(grid, self.config.game.clone())
            .map_err(RuntimeError::InitialState)?;

        let snapshots = self
            .snapshots
            .unwrap_or_else(|| Arc::new(InMemorySnapshotRepo::new()));
        let progress = self
            .progress
            .unwrap_or_else(|| Arc::new(InMemoryProgressRepo::new()));
        let identity = self.identity.unwrap_or_else(|| Arc::new(Anonymous));

        let (request_tx, request_rx) = mpsc::channel::<Request>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let handle = SessionHandle::new(request_tx, event_bus.clone(), identity.clone());
        let progress = ProgressTracker::new(progress, identity);

        let worker = SessionWorker::new(
            session,
            request_rx,
            event_bus,
            snapshots,
            self.config.step_interval,
        );
        let worker_handle = tokio::spawn(async move {
            worker.run().await;
        });

        tracing::info!(
            step_interval_ms = self.config.step_interval.as_millis() as u64,
            collision_recovery = %self.config.game.collision_recovery,
            crossroad_check = %self.config.game.crossroad_check,
            "Runtime started"
        );

        Ok(Runtime {
            handle,
            progress,
            config: self.config,
            worker_handle,
        })
    }
}
