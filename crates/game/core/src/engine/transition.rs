//! Single-move transition: the primitive step every instruction reduces to.

use crate::config::{CollisionRecovery, GameConfig};
use crate::grid::{Cell, Direction, GridError, Position};
use crate::state::SessionState;

use super::step::{Collision, CollisionKind, Step, StepOutcome};

/// Moves the player one cell in `direction` and applies scoring.
///
/// Pellets are consumed on entry. Walls, ghosts, and the grid edge are
/// collisions: the penalty is applied (score floors at zero) and the player
/// is put back according to the configured recovery policy.
pub(super) fn apply_move(
    instruction: usize,
    direction: Direction,
    run_origin: Position,
    state: &mut SessionState,
    config: &GameConfig,
) -> Result<Step, GridError> {
    let from = state.player;
    let target = from.neighbor(direction);

    let outcome = match state.grid.get(target) {
        None => collide(CollisionKind::Boundary, target, run_origin, state, config)?,
        Some(Cell::Wall) => collide(CollisionKind::Wall, target, run_origin, state, config)?,
        Some(Cell::Ghost) => collide(CollisionKind::Ghost, target, run_origin, state, config)?,
        Some(Cell::Pellet) => {
            relocate(state, target)?;
            state.score = state.score.saturating_add(config.pellet_reward);
            StepOutcome::AtePellet {
                reward: config.pellet_reward,
            }
        }
        Some(Cell::Empty | Cell::Player) => {
            relocate(state, target)?;
            StepOutcome::Moved
        }
    };

    Ok(Step {
        instruction,
        direction,
        from,
        player: state.player,
        outcome,
        score: state.score,
    })
}

fn collide(
    kind: CollisionKind,
    at: Position,
    run_origin: Position,
    state: &mut SessionState,
    config: &GameConfig,
) -> Result<StepOutcome, GridError> {
    let before = state.score;
    state.score = before.saturating_sub(config.collision_penalty);

    let reset_to = match config.collision_recovery {
        CollisionRecovery::SessionStart => state.start,
        CollisionRecovery::RunStart => run_origin,
        CollisionRecovery::StayInPlace => state.player,
    };
    if reset_to != state.player {
        relocate(state, reset_to)?;
    }

    Ok(StepOutcome::Collided(Collision {
        kind,
        at,
        penalty: before - state.score,
        reset_to,
    }))
}

/// Moves the player marker; the vacated cell becomes empty.
fn relocate(state: &mut SessionState, to: Position) -> Result<(), GridError> {
    // Bounds first, so a bad target leaves the player on the grid.
    state.grid.cell_at(to)?;
    state.grid.set_cell_at(state.player, Cell::Empty)?;
    state.grid.set_cell_at(to, Cell::Player)?;
    state.player = to;
    Ok(())
}
