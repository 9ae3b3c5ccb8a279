//! Session lifecycle on top of the engine.
//!
//! A [`Session`] owns its state exclusively and tracks at most one active run.
//! Queue edits, persistence hand-offs, and new runs are refused while a run is
//! active; only stepping, finishing, and aborting are allowed then.

use std::iter::FusedIterator;

use crate::command::{Command, Program, QueueError, SequenceError};
use crate::config::GameConfig;
use crate::engine::{GameEngine, Run, RunError, RunReport, Step};
use crate::error::{ErrorSeverity, GameError};
use crate::grid::Grid;
use crate::state::{InvariantError, SessionRecord, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionPhase {
    Idle,
    Running,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Run(#[from] RunError),

    #[error("a run is already in progress")]
    RunInProgress,

    #[error("no run is in progress")]
    NoActiveRun,

    #[error("invalid session state: {0}")]
    Invariant(#[from] InvariantError),
}

impl GameError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::Queue(err) => err.severity(),
            SessionError::Run(err) => err.severity(),
            SessionError::RunInProgress | SessionError::NoActiveRun => ErrorSeverity::Recoverable,
            SessionError::Invariant(err) => err.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::Queue(err) => err.error_code(),
            SessionError::Run(err) => err.error_code(),
            SessionError::RunInProgress => "RUN_IN_PROGRESS",
            SessionError::NoActiveRun => "NO_ACTIVE_RUN",
            SessionError::Invariant(err) => err.error_code(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    config: GameConfig,
    /// State a fresh session starts from; `reset` returns here.
    initial: SessionState,
    state: SessionState,
    active: Option<Run>,
}

impl Session {
    pub fn with_grid(grid: Grid, config: GameConfig) -> Result<Self, SessionError> {
        let initial = SessionState::new(grid, &config)?;
        Ok(Self {
            config,
            state: initial.clone(),
            initial,
            active: None,
        })
    }

    /// Session on the built-in maze.
    pub fn reference(config: GameConfig) -> Result<Self, SessionError> {
        Self::with_grid(Grid::reference_maze(), config)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        if self.active.is_some() {
            SessionPhase::Running
        } else {
            SessionPhase::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_run(&self) -> Option<&Run> {
        self.active.as_ref()
    }

    pub fn append_command(&mut self, command: Command) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.state.commands.push(command)?;
        Ok(())
    }

    pub fn remove_command(&mut self, index: usize) -> Result<Command, SessionError> {
        self.ensure_idle()?;
        Ok(self.state.commands.remove(index)?)
    }

    pub fn validate_queue(&self) -> Result<(), SequenceError> {
        Program::validate(self.state.commands.as_slice())
    }

    /// Whether `start_run` would currently succeed.
    pub fn can_run(&self) -> bool {
        self.active.is_none() && self.state.has_budget() && self.validate_queue().is_ok()
    }

    pub fn start_run(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        let run = GameEngine::new(&mut self.state, &self.config).start_run()?;
        self.active = Some(run);
        Ok(())
    }

    /// Applies the next move of the active run.
    ///
    /// Returns `None` once the run has ended; call [`Session::finish_run`]
    /// to apply the bookkeeping. An engine error discards the run.
    pub fn advance(&mut self) -> Result<Option<Step>, SessionError> {
        let run = self.active.as_mut().ok_or(SessionError::NoActiveRun)?;
        match GameEngine::new(&mut self.state, &self.config).advance(run) {
            Ok(step) => Ok(step),
            Err(err) => {
                self.active = None;
                Err(err.into())
            }
        }
    }

    /// Plays out any remaining moves and applies end-of-run bookkeeping.
    pub fn finish_run(&mut self) -> Result<RunReport, SessionError> {
        let mut run = self.active.take().ok_or(SessionError::NoActiveRun)?;
        let mut engine = GameEngine::new(&mut self.state, &self.config);
        while engine.advance(&mut run)?.is_some() {}
        Ok(engine.complete_run(run))
    }

    /// Stops the active run without spending an iteration or a life.
    ///
    /// A run that already collided or ran out of commands is finished with
    /// the usual bookkeeping instead.
    pub fn abort(&mut self) -> Result<RunReport, SessionError> {
        let run = self.active.take().ok_or(SessionError::NoActiveRun)?;
        Ok(GameEngine::new(&mut self.state, &self.config).abort_run(run))
    }

    /// Starts a run and yields its moves one at a time.
    pub fn run(&mut self) -> Result<RunSteps<'_>, SessionError> {
        self.start_run()?;
        Ok(RunSteps {
            session: self,
            done: false,
        })
    }

    /// Persistable copy of the current state, without the queue.
    pub fn snapshot(&self) -> Result<SessionRecord, SessionError> {
        self.ensure_idle()?;
        Ok(self.state.to_record())
    }

    /// Back to the initial map and budget with an empty queue.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.state = self.initial.clone();
        Ok(())
    }

    /// Replaces the state wholesale with a persisted record.
    pub fn restore(&mut self, record: SessionRecord) -> Result<(), SessionError> {
        self.ensure_idle()?;
        self.state = SessionState::from_record(record)?;
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        if self.active.is_some() {
            return Err(SessionError::RunInProgress);
        }
        Ok(())
    }
}

/// Single-pass iterator over the moves of the active run.
///
/// Dropping it leaves the run active on the session.
pub struct RunSteps<'a> {
    session: &'a mut Session,
    done: bool,
}

impl RunSteps<'_> {
    /// Session state after the most recent move.
    pub fn state(&self) -> &SessionState {
        self.session.state()
    }

    pub fn finish(self) -> Result<RunReport, SessionError> {
        self.session.finish_run()
    }

    pub fn abort(self) -> Result<RunReport, SessionError> {
        self.session.abort()
    }
}

impl Iterator for RunSteps<'_> {
    type Item = Result<Step, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.session.advance() {
            Ok(Some(step)) => Some(Ok(step)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl FusedIterator for RunSteps<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunOutcome;
    use crate::grid::Position;

    fn session() -> Session {
        Session::reference(GameConfig::default()).unwrap()
    }

    #[test]
    fn full_queue_refuses_append() {
        let mut session = session();
        for _ in 0..10 {
            session.append_command(Command::Up).unwrap();
        }
        let err = session.append_command(Command::Down).unwrap_err();
        assert_eq!(err, SessionError::Queue(QueueError::QueueFull { capacity: 10 }));
        assert_eq!(session.state().commands.len(), 10);
        assert!(err.severity().is_recoverable());
    }

    #[test]
    fn run_yields_each_move_then_finishes() {
        let mut session = session();
        session.append_command(Command::RunUntilWall).unwrap();
        session.append_command(Command::Left).unwrap();

        let mut steps = session.run().unwrap();
        let mut positions = Vec::new();
        while let Some(step) = steps.next() {
            let step = step.unwrap();
            assert_eq!(steps.state().player, step.player);
            positions.push(step.player);
        }
        assert!(steps.next().is_none());
        let report = steps.finish().unwrap();

        assert_eq!(positions, vec![Position::new(4, 5), Position::new(3, 5)]);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.iterations, 19);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.state().commands.is_empty());
    }

    #[test]
    fn operations_are_refused_during_a_run() {
        let mut session = session();
        session.append_command(Command::Left).unwrap();
        session.start_run().unwrap();
        assert_eq!(session.phase(), SessionPhase::Running);
        assert!(!session.can_run());

        assert_eq!(session.start_run(), Err(SessionError::RunInProgress));
        assert_eq!(
            session.append_command(Command::Up),
            Err(SessionError::RunInProgress)
        );
        assert_eq!(session.remove_command(0), Err(SessionError::RunInProgress));
        assert_eq!(session.snapshot(), Err(SessionError::RunInProgress));
        assert_eq!(session.reset(), Err(SessionError::RunInProgress));

        let report = session.finish_run().unwrap();
        assert_eq!(report.score, 10);
        assert_eq!(session.finish_run(), Err(SessionError::NoActiveRun));
    }

    #[test]
    fn abort_mid_run_keeps_budget() {
        let mut session = session();
        for command in [Command::Left, Command::Left, Command::Down] {
            session.append_command(command).unwrap();
        }

        let mut steps = session.run().unwrap();
        steps.next().unwrap().unwrap();
        let report = steps.abort().unwrap();

        assert!(report.aborted());
        assert_eq!(session.state().lives, 3);
        assert_eq!(session.state().iterations, 20);
        assert_eq!(
            session.state().commands.as_slice(),
            &[Command::Left, Command::Down]
        );
        assert_eq!(session.abort(), Err(SessionError::NoActiveRun));
    }

    #[test]
    fn abort_after_collision_still_costs_a_life() {
        let mut session = session();
        session.append_command(Command::Up).unwrap();
        session.append_command(Command::Left).unwrap();

        let mut steps = session.run().unwrap();
        let step = steps.next().unwrap().unwrap();
        assert!(step.collision().is_some());
        let report = steps.abort().unwrap();

        assert!(report.collided());
        assert_eq!((report.lives, report.iterations), (2, 19));
        assert_eq!(report.retained_commands, 0);
        assert_eq!(session.state().lives, 2);
        assert!(session.state().commands.is_empty());
        assert!(!session.is_running());
    }

    #[test]
    fn run_is_finished_after_its_last_move() {
        let mut session = session();
        session.append_command(Command::Left).unwrap();
        session.start_run().unwrap();

        session.advance().unwrap().unwrap();
        assert!(session.active_run().is_some_and(Run::is_finished));

        let report = session.abort().unwrap();
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(session.state().iterations, 19);
    }

    #[test]
    fn invalid_queue_cannot_start() {
        let mut session = session();
        session.append_command(Command::RunUntilCrossroad).unwrap();
        assert!(!session.can_run());
        assert_eq!(session.validate_queue().unwrap_err().index, 0);

        let before = session.state().clone();
        let err = session.start_run().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_SEQUENCE");
        assert_eq!(session.state(), &before);
        assert!(!session.is_running());
    }

    #[test]
    fn reset_and_restore_replace_state() {
        let mut session = session();
        session.append_command(Command::Left).unwrap();
        session.run().unwrap().finish().unwrap();
        let saved = session.snapshot().unwrap();

        session.append_command(Command::Up).unwrap();
        session.reset().unwrap();
        assert_eq!(session.state().score, 0);
        assert_eq!(session.state().iterations, 20);
        assert_eq!(session.state().player, Position::new(5, 5));
        assert!(session.state().commands.is_empty());

        session.append_command(Command::Down).unwrap();
        session.restore(saved).unwrap();
        assert_eq!(session.state().score, 10);
        assert_eq!(session.state().player, Position::new(4, 5));
        assert!(session.state().commands.is_empty());
    }

    #[test]
    fn restore_rejects_inconsistent_records() {
        let mut session = session();
        let mut record = session.snapshot().unwrap();
        record.player = Position::new(1, 1);

        let err = session.restore(record).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Invariant(InvariantError::PlayerDesync { .. })
        ));
        assert_eq!(session.state().player, Position::new(5, 5));
    }
}
