use arrayvec::ArrayVec;

use super::Command;
use crate::config::GameConfig;
use crate::error::{ErrorSeverity, GameError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueueError {
    #[error("command queue is full ({capacity} entries)")]
    QueueFull { capacity: usize },

    #[error("no queued command at index {index} (queue holds {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

impl GameError for QueueError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            QueueError::QueueFull { .. } => ErrorSeverity::Recoverable,
            QueueError::IndexOutOfRange { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            QueueError::QueueFull { .. } => "QUEUE_FULL",
            QueueError::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
        }
    }
}

/// Ordered, bounded sequence of queued commands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CommandQueue {
    commands: ArrayVec<Command, { GameConfig::MAX_COMMANDS }>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn capacity(&self) -> usize {
        GameConfig::MAX_COMMANDS
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.commands.is_full()
    }

    /// Appends at the tail, refusing once the queue is at capacity.
    pub fn push(&mut self, command: Command) -> Result<(), QueueError> {
        self.commands
            .try_push(command)
            .map_err(|_| QueueError::QueueFull {
                capacity: GameConfig::MAX_COMMANDS,
            })
    }

    /// Removes and returns the entry at `index`, shifting later entries left.
    pub fn remove(&mut self, index: usize) -> Result<Command, QueueError> {
        let len = self.commands.len();
        self.commands
            .pop_at(index)
            .ok_or(QueueError::IndexOutOfRange { index, len })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Drops the first `count` entries, keeping the remainder in order.
    pub fn drain_front(&mut self, count: usize) {
        let count = count.min(self.commands.len());
        self.commands.drain(..count);
    }

    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }

    pub fn iter(&self) -> impl Iterator<Item = Command> + '_ {
        self.commands.iter().copied()
    }
}

impl<'a> IntoIterator for &'a CommandQueue {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
