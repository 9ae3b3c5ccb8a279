use std::fmt;

use super::Command;
use crate::error::{ErrorSeverity, GameError};
use crate::grid::Direction;

/// Why a queued sequence cannot be executed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SequenceFault {
    /// The compound command is the last entry in the queue.
    MissingDirection,
    /// The compound command is followed by another compound command.
    AdjacentCompound,
}

impl fmt::Display for SequenceFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SequenceFault::MissingDirection => "has no direction after it",
            SequenceFault::AdjacentCompound => "is followed by another loop command",
        })
    }
}

/// A compound command at `index` is not followed by a primitive direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("invalid command sequence at index {index}: {command} {fault}")]
pub struct SequenceError {
    pub index: usize,
    pub command: Command,
    pub fault: SequenceFault,
}

impl GameError for SequenceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        "INVALID_SEQUENCE"
    }
}

/// A queue entry with any compound command already paired to its direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    Step(Direction),
    UntilWall(Direction),
    UntilCrossroad(Direction),
}

impl Instruction {
    pub const fn direction(self) -> Direction {
        match self {
            Instruction::Step(direction)
            | Instruction::UntilWall(direction)
            | Instruction::UntilCrossroad(direction) => direction,
        }
    }

    pub const fn is_loop(self) -> bool {
        !matches!(self, Instruction::Step(_))
    }

    /// Number of queue entries this instruction was built from.
    pub const fn span(self) -> usize {
        if self.is_loop() { 2 } else { 1 }
    }
}

/// Validated, pre-paired instruction sequence consumed by the engine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Pairs every compound command with the direction that follows it.
    ///
    /// Fails on the first compound command that is last in the queue or is
    /// followed by another compound command.
    pub fn compile(commands: &[Command]) -> Result<Self, SequenceError> {
        let mut instructions = Vec::with_capacity(commands.len());
        let mut index = 0;

        while let Some(&command) = commands.get(index) {
            if let Some(direction) = command.direction() {
                instructions.push(Instruction::Step(direction));
                index += 1;
                continue;
            }

            let direction = match commands.get(index + 1) {
                None => {
                    return Err(SequenceError {
                        index,
                        command,
                        fault: SequenceFault::MissingDirection,
                    });
                }
                Some(next) => next.direction().ok_or(SequenceError {
                    index,
                    command,
                    fault: SequenceFault::AdjacentCompound,
                })?,
            };

            instructions.push(match command {
                Command::RunUntilWall => Instruction::UntilWall(direction),
                _ => Instruction::UntilCrossroad(direction),
            });
            index += 2;
        }

        Ok(Self { instructions })
    }

    /// Checks a queue without keeping the compiled form.
    pub fn validate(commands: &[Command]) -> Result<(), SequenceError> {
        Self::compile(commands).map(drop)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Instruction> {
        self.instructions.get(index).copied()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of queue entries covered by the first `count` instructions.
    pub fn source_len(&self, count: usize) -> usize {
        self.instructions
            .iter()
            .take(count)
            .map(|instruction| instruction.span())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_compound_with_following_direction() {
        let program = Program::compile(&[
            Command::Left,
            Command::RunUntilWall,
            Command::Up,
            Command::RunUntilCrossroad,
            Command::Right,
        ])
        .unwrap();

        assert_eq!(
            program.instructions(),
            &[
                Instruction::Step(Direction::Left),
                Instruction::UntilWall(Direction::Up),
                Instruction::UntilCrossroad(Direction::Right),
            ]
        );
        assert_eq!(program.source_len(2), 3);
        assert_eq!(program.source_len(3), 5);
    }

    #[test]
    fn lone_compound_fails_at_its_index() {
        let err = Program::compile(&[Command::RunUntilWall]).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.fault, SequenceFault::MissingDirection);
        assert_eq!(err.error_code(), "INVALID_SEQUENCE");
    }

    #[test]
    fn adjacent_compounds_report_the_first() {
        let err = Program::compile(&[
            Command::Down,
            Command::RunUntilCrossroad,
            Command::RunUntilWall,
            Command::Left,
        ])
        .unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.command, Command::RunUntilCrossroad);
        assert_eq!(err.fault, SequenceFault::AdjacentCompound);
    }

    #[test]
    fn empty_queue_is_valid() {
        assert!(Program::compile(&[]).unwrap().is_empty());
        assert!(Program::validate(&[Command::Up, Command::Up]).is_ok());
    }
}
