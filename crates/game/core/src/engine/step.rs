use crate::grid::{Direction, Position};

/// What the player ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CollisionKind {
    Wall,
    Ghost,
    /// The move would have left the grid.
    Boundary,
}

/// A collision ends the run. All kinds share the same scoring and life effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Collision {
    pub kind: CollisionKind,
    /// The cell the player tried to enter.
    pub at: Position,
    /// Score actually removed (less than configured when near zero).
    pub penalty: u32,
    /// Where the player was put back.
    pub reset_to: Position,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepOutcome {
    Moved,
    AtePellet { reward: u32 },
    Collided(Collision),
}

/// One applied move, emitted for progressive display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Step {
    /// Index of the instruction in the compiled program.
    pub instruction: usize,
    pub direction: Direction,
    pub from: Position,
    /// Player position after the step (the reset target after a collision).
    pub player: Position,
    pub outcome: StepOutcome,
    /// Score after the step.
    pub score: u32,
}

impl Step {
    pub fn score_delta(&self) -> i64 {
        match self.outcome {
            StepOutcome::Moved => 0,
            StepOutcome::AtePellet { reward } => i64::from(reward),
            StepOutcome::Collided(collision) => -i64::from(collision.penalty),
        }
    }

    pub fn collision(&self) -> Option<Collision> {
        match self.outcome {
            StepOutcome::Collided(collision) => Some(collision),
            _ => None,
        }
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunOutcome {
    /// Every queued command executed.
    Completed,
    /// A collision ended the run early.
    Collided(Collision),
    /// The player stopped the run; no bookkeeping was applied.
    Aborted,
}

/// Final, authoritative summary of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub steps: usize,
    pub score_before: u32,
    pub score: u32,
    pub lives: u32,
    pub iterations: u32,
    pub player: Position,
    /// Queue entries left after the run (non-zero only when aborted).
    pub retained_commands: usize,
}

impl RunReport {
    pub fn collided(&self) -> bool {
        matches!(self.outcome, RunOutcome::Collided(_))
    }

    pub fn aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted)
    }
}
