//! Command vocabulary: the closed set of instructions a player can queue.
//!
//! Primitive commands move one cell. Compound commands loop and borrow their
//! direction from the entry that follows them in the queue; [`Program`]
//! resolves those pairs before any simulation starts.

mod program;
mod queue;

use crate::grid::Direction;

pub use program::{Instruction, Program, SequenceError, SequenceFault};
pub use queue::{CommandQueue, QueueError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Command {
    #[strum(to_string = "left", serialize = "l")]
    Left,
    #[strum(to_string = "right", serialize = "r")]
    Right,
    #[strum(to_string = "up", serialize = "u")]
    Up,
    #[strum(to_string = "down", serialize = "d")]
    Down,
    /// Repeat the following direction until the next cell is a wall.
    #[strum(to_string = "run-until-wall", serialize = "until-wall")]
    RunUntilWall,
    /// Repeat the following direction until a crossroad (or a wall).
    #[strum(to_string = "run-until-crossroad", serialize = "until-crossroad")]
    RunUntilCrossroad,
}

impl Command {
    /// Direction of a primitive command; `None` for compound commands.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Command::Left => Some(Direction::Left),
            Command::Right => Some(Direction::Right),
            Command::Up => Some(Direction::Up),
            Command::Down => Some(Direction::Down),
            Command::RunUntilWall | Command::RunUntilCrossroad => None,
        }
    }

    pub const fn is_compound(self) -> bool {
        matches!(self, Command::RunUntilWall | Command::RunUntilCrossroad)
    }
}

impl From<Direction> for Command {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Left => Command::Left,
            Direction::Right => Command::Right,
            Direction::Up => Command::Up,
            Direction::Down => Command::Down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_names() {
        assert_eq!("left".parse::<Command>().unwrap(), Command::Left);
        assert_eq!("D".parse::<Command>().unwrap(), Command::Down);
        assert_eq!(
            "until-wall".parse::<Command>().unwrap(),
            Command::RunUntilWall
        );
        assert_eq!(
            "Run-Until-Crossroad".parse::<Command>().unwrap(),
            Command::RunUntilCrossroad
        );
        assert!("jump".parse::<Command>().is_err());
    }

    #[test]
    fn only_primitives_carry_a_direction() {
        for direction in Direction::ALL {
            let command = Command::from(direction);
            assert_eq!(command.direction(), Some(direction));
            assert!(!command.is_compound());
        }
        assert_eq!(Command::RunUntilWall.direction(), None);
        assert!(Command::RunUntilCrossroad.is_compound());
    }
}
