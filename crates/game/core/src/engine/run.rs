//! Per-run cursor over a compiled program.

use crate::command::{Instruction, Program};
use crate::config::{CrossroadCheck, GameConfig};
use crate::grid::Position;
use crate::state::SessionState;

use super::errors::RunError;
use super::step::{Collision, Step, StepOutcome};
use super::transition;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunPhase {
    Stepping,
    Collided,
    Completed,
}

/// Progress through one run.
///
/// The cursor owns no session data, so the state it advances can be read
/// between steps. Each call to `advance` applies at most one move.
#[derive(Clone, Debug)]
pub struct Run {
    program: Program,
    cursor: usize,
    /// Moves made by the loop instruction under the cursor.
    loop_moves: usize,
    /// Whether the instruction under the cursor has begun.
    started: bool,
    origin: Position,
    score_before: u32,
    steps: usize,
    phase: RunPhase,
    collision: Option<Collision>,
}

impl Run {
    pub(crate) fn new(program: Program, origin: Position, score_before: u32) -> Self {
        Self {
            program,
            cursor: 0,
            loop_moves: 0,
            started: false,
            origin,
            score_before,
            steps: 0,
            phase: RunPhase::Stepping,
            collision: None,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase != RunPhase::Stepping
    }

    pub fn score_before(&self) -> u32 {
        self.score_before
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    pub fn collision(&self) -> Option<Collision> {
        self.collision
    }

    /// Queue entries whose instruction has started executing.
    pub fn consumed_commands(&self) -> usize {
        let begun = self.cursor + usize::from(self.started);
        self.program.source_len(begun)
    }

    pub(crate) fn advance(
        &mut self,
        state: &mut SessionState,
        config: &GameConfig,
    ) -> Result<Option<Step>, RunError> {
        loop {
            if self.phase != RunPhase::Stepping {
                return Ok(None);
            }

            let Some(instruction) = self.program.get(self.cursor) else {
                self.phase = RunPhase::Completed;
                return Ok(None);
            };
            self.started = true;

            // A loop that never moves still consumes its instruction.
            if instruction.is_loop() && self.loop_should_stop(instruction, state, config) {
                self.next_instruction();
                continue;
            }

            let step = transition::apply_move(
                self.cursor,
                instruction.direction(),
                self.origin,
                state,
                config,
            )?;
            self.steps += 1;

            if let StepOutcome::Collided(collision) = step.outcome {
                self.phase = RunPhase::Collided;
                self.collision = Some(collision);
            } else if instruction.is_loop() {
                self.loop_moves += 1;
            } else {
                self.next_instruction();
            }

            return Ok(Some(step));
        }
    }

    /// Moves past the current instruction. Stepping off the end completes
    /// the run, so a finished run is never left looking active.
    fn next_instruction(&mut self) {
        self.cursor += 1;
        self.loop_moves = 0;
        self.started = false;
        if self.cursor >= self.program.len() {
            self.phase = RunPhase::Completed;
        }
    }

    fn loop_should_stop(
        &self,
        instruction: Instruction,
        state: &SessionState,
        config: &GameConfig,
    ) -> bool {
        let next = state.player.neighbor(instruction.direction());
        if state.grid.is_blocked(next) {
            return true;
        }

        match instruction {
            Instruction::Step(_) | Instruction::UntilWall(_) => false,
            Instruction::UntilCrossroad(_) => match config.crossroad_check {
                CrossroadCheck::Landing => {
                    self.loop_moves > 0 && state.grid.is_crossroad(state.player)
                }
                CrossroadCheck::Lookahead => state.grid.is_crossroad(next),
            },
        }
    }
}
