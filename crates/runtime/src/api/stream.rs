//! Progressive view of a paced run.
use tokio::sync::{mpsc, oneshot};

use ctman_core::{RunReport, SessionState, Step};

use super::errors::{Result, RuntimeError};

/// One applied move and the session state right after it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepSnapshot {
    pub step: Step,
    pub state: SessionState,
}

/// Steps of a single run, delivered as the worker applies them.
///
/// The stream is finite and consumed once. Dropping it does not stop the run;
/// use [`super::SessionHandle::abort`] for that.
pub struct RunStream {
    steps: mpsc::UnboundedReceiver<StepSnapshot>,
    report: oneshot::Receiver<Result<RunReport>>,
}

impl RunStream {
    pub(crate) fn new(
        steps: mpsc::UnboundedReceiver<StepSnapshot>,
        report: oneshot::Receiver<Result<RunReport>>,
    ) -> Self {
        Self { steps, report }
    }

    /// Next applied step, or `None` once the run has ended.
    pub async fn next_step(&mut self) -> Option<StepSnapshot> {
        self.steps.recv().await
    }

    /// Waits for the run to end and returns its report.
    ///
    /// Steps not yet read are discarded.
    pub async fn finish(self) -> Result<RunReport> {
        self.report.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Reads every remaining step, then the report.
    pub async fn collect(mut self) -> Result<(Vec<StepSnapshot>, RunReport)> {
        let mut steps = Vec::new();
        while let Some(snapshot) = self.next_step().await {
            steps.push(snapshot);
        }
        let report = self.finish().await?;
        Ok((steps, report))
    }
}
