//! Run execution pipeline.
//!
//! The [`GameEngine`] is the authoritative reducer for [`SessionState`]. A run
//! is started from the queued commands, advanced one move at a time, and then
//! either completed (iteration and life bookkeeping applied) or aborted (no
//! bookkeeping). Callers that do not need pacing use [`GameEngine::execute`].

mod errors;
mod run;
mod step;
mod transition;

pub use errors::RunError;
pub use run::{Run, RunPhase};
pub use step::{Collision, CollisionKind, RunOutcome, RunReport, Step, StepOutcome};

use crate::command::Program;
use crate::config::GameConfig;
use crate::state::SessionState;

/// Applies runs to a borrowed session state.
///
/// The engine holds no run data of its own; the [`Run`] cursor is returned to
/// the caller so it can be parked between steps.
pub struct GameEngine<'a> {
    state: &'a mut SessionState,
    config: &'a GameConfig,
}

impl<'a> GameEngine<'a> {
    pub fn new(state: &'a mut SessionState, config: &'a GameConfig) -> Self {
        Self { state, config }
    }

    /// Checks the budget and compiles the queue. Nothing is mutated on error.
    pub fn start_run(&self) -> Result<Run, RunError> {
        if !self.state.has_budget() {
            return Err(RunError::SessionExhausted {
                lives: self.state.lives,
                iterations: self.state.iterations,
            });
        }

        let program = Program::compile(self.state.commands.as_slice())?;
        Ok(Run::new(program, self.state.player, self.state.score))
    }

    /// Applies the next move of `run`, or returns `None` once it has ended.
    pub fn advance(&mut self, run: &mut Run) -> Result<Option<Step>, RunError> {
        run.advance(self.state, self.config)
    }

    /// Applies end-of-run bookkeeping.
    ///
    /// Any moves the run has not yet made are discarded. One iteration is
    /// spent, one life is lost on collision, and the queue is cleared.
    pub fn complete_run(&mut self, run: Run) -> RunReport {
        self.state.iterations = self.state.iterations.saturating_sub(1);
        let outcome = match run.collision() {
            Some(collision) => {
                self.state.lives = self.state.lives.saturating_sub(1);
                RunOutcome::Collided(collision)
            }
            None => RunOutcome::Completed,
        };
        self.state.commands.clear();

        self.report(&run, outcome)
    }

    /// Stops `run` without bookkeeping.
    ///
    /// Moves already made stand. Only queue entries whose instruction never
    /// started are kept. A run that has already collided or completed is
    /// not stoppable any more and gets the normal bookkeeping instead.
    pub fn abort_run(&mut self, run: Run) -> RunReport {
        if run.is_finished() {
            return self.complete_run(run);
        }
        self.state.commands.drain_front(run.consumed_commands());
        self.report(&run, RunOutcome::Aborted)
    }

    /// Runs the whole queue without pacing.
    pub fn execute(&mut self) -> Result<(Vec<Step>, RunReport), RunError> {
        let mut run = self.start_run()?;
        let mut steps = Vec::new();
        while let Some(step) = self.advance(&mut run)? {
            steps.push(step);
        }
        Ok((steps, self.complete_run(run)))
    }

    fn report(&self, run: &Run, outcome: RunOutcome) -> RunReport {
        RunReport {
            outcome,
            steps: run.steps_taken(),
            score_before: run.score_before(),
            score: self.state.score,
            lives: self.state.lives,
            iterations: self.state.iterations,
            player: self.state.player,
            retained_commands: self.state.commands.len(),
        }
    }
}
