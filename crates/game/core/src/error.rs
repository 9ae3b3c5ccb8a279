//! Common error infrastructure for ctman-core.
//!
//! Domain-specific errors (e.g., `GridError`, `SequenceError`) are defined in
//! their respective modules alongside the operations they guard. This module
//! holds the shared classification used by callers to decide whether a failure
//! is something the player can fix or a bug in the engine.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each concern has its own error type with specific variants
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **No side effects**: Every user-recoverable error leaves the session untouched

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: The request was refused; the player can retry once the
///   blocking condition clears (queue shrinks, run finishes)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted session state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry once the session changes.
    ///
    /// Examples: queue full, run in progress, no lives left
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: dangling compound command, queue index out of range
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: grid indexed outside its extent, player marker missing
    /// These indicate bugs and should be investigated.
    Internal,

    /// Fatal error - session state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all ctman-core errors.
///
/// This trait provides a uniform interface for error classification across
/// all error types in the crate.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// This is useful for error categorization, logging, and testing.
    fn error_code(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_and_validation_are_user_fixable() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(ErrorSeverity::Validation.is_recoverable());
        assert!(!ErrorSeverity::Internal.is_recoverable());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Internal.as_str(), "internal");
    }
}
