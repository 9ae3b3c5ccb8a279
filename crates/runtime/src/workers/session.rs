//! Session worker that owns the authoritative [`ctman_core::Session`].
//!
//! Receives requests from [`crate::api::SessionHandle`], drives paced runs,
//! talks to the snapshot repository, and publishes events to the EventBus.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use ctman_core::{Command, Run, RunReport, Session, SessionError, SessionState};

use crate::api::{Result, RunStream, RuntimeError, StepSnapshot};
use crate::events::{Event, EventBus, PersistenceEvent, RunEvent};
use crate::repository::{
    RepositoryError, SnapshotId, SnapshotRepository, SnapshotSummary, UserId,
};

/// Requests that can be sent to the session worker
pub enum Request {
    AppendCommand {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    RemoveCommand {
        index: usize,
        reply: oneshot::Sender<Result<Command>>,
    },
    /// Start a paced run. The reply carries the step stream.
    Run {
        reply: oneshot::Sender<Result<RunStream>>,
    },
    /// Stop the active run at the next step boundary.
    Abort {
        reply: oneshot::Sender<Result<RunReport>>,
    },
    /// Read-only copy of the session state.
    QueryState {
        reply: oneshot::Sender<SessionState>,
    },
    Save {
        user: UserId,
        name: String,
        reply: oneshot::Sender<Result<SnapshotId>>,
    },
    Load {
        user: UserId,
        id: SnapshotId,
        reply: oneshot::Sender<Result<()>>,
    },
    Reset {
        reply: oneshot::Sender<Result<()>>,
    },
    ListSaves {
        user: UserId,
        reply: oneshot::Sender<Result<Vec<SnapshotSummary>>>,
    },
    DeleteSave {
        user: UserId,
        id: SnapshotId,
        reply: oneshot::Sender<Result<()>>,
    },
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::AppendCommand { .. } => "AppendCommand",
            Request::RemoveCommand { .. } => "RemoveCommand",
            Request::Run { .. } => "Run",
            Request::Abort { .. } => "Abort",
            Request::QueryState { .. } => "QueryState",
            Request::Save { .. } => "Save",
            Request::Load { .. } => "Load",
            Request::Reset { .. } => "Reset",
            Request::ListSaves { .. } => "ListSaves",
            Request::DeleteSave { .. } => "DeleteSave",
        }
    }
}

/// What happened while waiting between two steps.
enum Pause {
    Continue,
    Abort(oneshot::Sender<Result<RunReport>>),
}

/// Background task that serialises all access to one session.
pub struct SessionWorker {
    session: Session,
    request_rx: mpsc::Receiver<Request>,
    event_bus: EventBus,
    snapshots: Arc<dyn SnapshotRepository>,
    step_interval: Duration,
    /// Set once every handle is gone; remaining steps then run unpaced.
    detached: bool,
}

impl SessionWorker {
    pub fn new(
        session: Session,
        request_rx: mpsc::Receiver<Request>,
        event_bus: EventBus,
        snapshots: Arc<dyn SnapshotRepository>,
        step_interval: Duration,
    ) -> Self {
        info!(
            player = %session.state().player,
            lives = session.state().lives,
            iterations = session.state().iterations,
            "SessionWorker initialized"
        );

        Self {
            session,
            request_rx,
            event_bus,
            snapshots,
            step_interval,
            detached: false,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            self.handle_request(request).await;
        }
        debug!("SessionWorker stopped: all handles dropped");
    }

    async fn handle_request(&mut self, request: Request) {
        match request {
            Request::AppendCommand { command, reply } => {
                let result = self.session.append_command(command).map_err(Into::into);
                send_reply(reply, result, "AppendCommand");
            }
            Request::RemoveCommand { index, reply } => {
                let result = self.session.remove_command(index).map_err(Into::into);
                send_reply(reply, result, "RemoveCommand");
            }
            Request::Run { reply } => self.start_run(reply).await,
            Request::Abort { reply } => {
                send_reply(reply, Err(SessionError::NoActiveRun.into()), "Abort");
            }
            Request::QueryState { reply } => {
                send_reply(reply, self.session.state().clone(), "QueryState");
            }
            Request::Save { user, name, reply } => {
                let result = self.save(&user, name).await;
                send_reply(reply, result, "Save");
            }
            Request::Load { user, id, reply } => {
                let result = self.load(&user, id).await;
                send_reply(reply, result, "Load");
            }
            Request::Reset { reply } => {
                let result = self.session.reset().map_err(Into::into);
                if result.is_ok() {
                    info!("Session reset to the initial map");
                    self.event_bus
                        .publish(Event::Persistence(PersistenceEvent::Reset));
                }
                send_reply(reply, result, "Reset");
            }
            Request::ListSaves { user, reply } => {
                let result = self
                    .snapshots
                    .list_snapshots(&user)
                    .await
                    .map_err(Into::into);
                send_reply(reply, result, "ListSaves");
            }
            Request::DeleteSave { user, id, reply } => {
                let result = self.delete(&user, id).await;
                send_reply(reply, result, "DeleteSave");
            }
        }
    }

    async fn save(&mut self, user: &UserId, name: String) -> Result<SnapshotId> {
        let record = self.session.snapshot()?;
        let id = self.snapshots.save_snapshot(user, &name, &record).await?;

        info!(user = %user, id = %id, name = %name, "Session saved");
        self.event_bus
            .publish(Event::Persistence(PersistenceEvent::Saved {
                id: id.clone(),
                name,
            }));
        Ok(id)
    }

    async fn load(&mut self, user: &UserId, id: SnapshotId) -> Result<()> {
        let snapshot = self
            .snapshots
            .load_snapshot(user, &id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        self.session.restore(snapshot.record)?;

        info!(user = %user, id = %id, name = %snapshot.name, "Session loaded");
        self.event_bus
            .publish(Event::Persistence(PersistenceEvent::Loaded { id }));
        Ok(())
    }

    async fn delete(&mut self, user: &UserId, id: SnapshotId) -> Result<()> {
        self.snapshots.delete_snapshot(user, &id).await?;
        info!(user = %user, id = %id, "Snapshot deleted");
        self.event_bus
            .publish(Event::Persistence(PersistenceEvent::Deleted { id }));
        Ok(())
    }

    async fn start_run(&mut self, reply: oneshot::Sender<Result<RunStream>>) {
        if let Err(err) = self.session.start_run() {
            warn!(error = %err, "Run refused");
            send_reply(reply, Err(err.into()), "Run");
            return;
        }

        let state = self.session.state();
        info!(
            commands = state.commands.len(),
            lives = state.lives,
            iterations = state.iterations,
            "Run started"
        );
        self.event_bus.publish(Event::Run(RunEvent::Started {
            commands: state.commands.iter().collect(),
            player: state.player,
            score: state.score,
        }));

        let (step_tx, step_rx) = mpsc::unbounded_channel();
        let (report_tx, report_rx) = oneshot::channel();
        send_reply(reply, Ok(RunStream::new(step_rx, report_rx)), "Run");

        let result = self.drive_run(&step_tx).await;
        // A dropped stream is fine; the report is also on the event bus.
        let _ = report_tx.send(result);
    }

    /// Steps the active run to its end, pausing between steps.
    async fn drive_run(
        &mut self,
        steps: &mpsc::UnboundedSender<StepSnapshot>,
    ) -> Result<RunReport> {
        loop {
            if let Pause::Abort(reply) = self.pause().await {
                let result = self.session.abort();
                match &result {
                    Ok(report) if report.aborted() => {
                        warn!(
                            steps = report.steps,
                            retained = report.retained_commands,
                            "Run aborted"
                        );
                        self.event_bus
                            .publish(Event::Run(RunEvent::Aborted { report: *report }));
                    }
                    Ok(report) => {
                        self.event_bus
                            .publish(Event::Run(RunEvent::Finished { report: *report }));
                    }
                    Err(_) => {}
                }
                send_reply(reply, result.clone().map_err(Into::into), "Abort");
                return result.map_err(Into::into);
            }

            match self.session.advance() {
                Ok(Some(step)) => {
                    debug!(
                        instruction = step.instruction,
                        direction = %step.direction,
                        player = %step.player,
                        score = step.score,
                        "Step applied"
                    );
                    self.event_bus.publish(Event::Run(RunEvent::Stepped { step }));
                    let _ = steps.send(StepSnapshot {
                        step,
                        state: self.session.state().clone(),
                    });

                    // No pause after the last move: the run is over and an
                    // abort must not skip its bookkeeping.
                    if self.session.active_run().is_some_and(Run::is_finished) {
                        return self.finish_run();
                    }
                }
                Ok(None) => return self.finish_run(),
                Err(err) => {
                    warn!(error = %err, "Run failed");
                    return Err(err.into());
                }
            }
        }
    }

    fn finish_run(&mut self) -> Result<RunReport> {
        let report = self.session.finish_run()?;
        info!(
            outcome = ?report.outcome,
            score = report.score,
            lives = report.lives,
            iterations = report.iterations,
            "Run finished"
        );
        self.event_bus
            .publish(Event::Run(RunEvent::Finished { report }));
        Ok(report)
    }

    /// Waits out the step interval while serving requests.
    ///
    /// Suspension only happens here, between steps, so every state a reader
    /// observes is a complete post-step state.
    async fn pause(&mut self) -> Pause {
        if self.detached {
            return Pause::Continue;
        }

        if self.step_interval.is_zero() {
            tokio::task::yield_now().await;
            loop {
                match self.request_rx.try_recv() {
                    Ok(request) => {
                        if let Some(reply) = self.handle_during_run(request) {
                            return Pause::Abort(reply);
                        }
                    }
                    Err(TryRecvError::Empty) => return Pause::Continue,
                    Err(TryRecvError::Disconnected) => {
                        self.detached = true;
                        return Pause::Continue;
                    }
                }
            }
        }

        let sleep = tokio::time::sleep(self.step_interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return Pause::Continue,
                request = self.request_rx.recv() => match request {
                    Some(request) => {
                        if let Some(reply) = self.handle_during_run(request) {
                            return Pause::Abort(reply);
                        }
                    }
                    None => {
                        self.detached = true;
                        return Pause::Continue;
                    }
                },
            }
        }
    }

    /// Serves a request that arrived mid-run.
    ///
    /// Only `Abort` and `QueryState` are honoured. An abort hands its reply
    /// channel back to the run loop.
    fn handle_during_run(
        &mut self,
        request: Request,
    ) -> Option<oneshot::Sender<Result<RunReport>>> {
        let name = request.name();
        match request {
            Request::Abort { reply } => return Some(reply),
            Request::QueryState { reply } => {
                send_reply(reply, self.session.state().clone(), name);
                return None;
            }
            _ => {}
        }

        warn!(request = name, "Request refused: run in progress");
        match request {
            Request::AppendCommand { reply, .. }
            | Request::Load { reply, .. }
            | Request::Reset { reply }
            | Request::DeleteSave { reply, .. } => send_reply(reply, Err(refused()), name),
            Request::RemoveCommand { reply, .. } => send_reply(reply, Err(refused()), name),
            Request::Run { reply } => send_reply(reply, Err(refused()), name),
            Request::Save { reply, .. } => send_reply(reply, Err(refused()), name),
            Request::ListSaves { reply, .. } => send_reply(reply, Err(refused()), name),
            Request::Abort { .. } | Request::QueryState { .. } => {}
        }
        None
    }
}

fn refused() -> RuntimeError {
    SessionError::RunInProgress.into()
}

fn send_reply<T>(reply: oneshot::Sender<T>, value: T, request: &'static str) {
    if reply.send(value).is_err() {
        debug!("{request} reply channel closed (caller dropped)");
    }
}
