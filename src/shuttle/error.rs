use thiserror::Error;

use super::command::CommandKind;
use super::location::Location;
use super::text::TextId;
use crate::storage::RepositoryError;

/// Errors raised by the shuttle engine
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{command} is not legal at {location}")]
    IllegalTransition {
        location: Location,
        command: CommandKind,
    },

    #[error("Unknown location '{0}'")]
    UnknownLocation(String),

    #[error("{command} rejected: text is terminal at {location}")]
    TerminalStateViolation {
        location: Location,
        command: CommandKind,
    },

    #[error("Concurrent modification of text {text_id}: expected version {expected}, found {found}")]
    ConcurrentModification {
        text_id: TextId,
        expected: u64,
        found: u64,
    },

    #[error("Joint committee cannot be convened yet: {reason}")]
    PrematureCmp { reason: String },

    #[error("Text {0} not found")]
    TextNotFound(TextId),

    #[error("Invalid text: {0}")]
    InvalidText(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for EngineError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::VersionMismatch {
                text_id,
                expected,
                found,
            } => EngineError::ConcurrentModification {
                text_id,
                expected,
                found,
            },
            RepositoryError::UnknownLocation(name) => EngineError::UnknownLocation(name),
            other => EngineError::Storage(other),
        }
    }
}

impl EngineError {
    /// Data corruption or version skew; must never be swallowed
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownLocation(_)
                | EngineError::InvariantViolation(_)
                | EngineError::Storage(RepositoryError::Serialization(_))
        )
    }

    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::ConcurrentModification { .. })
    }
}
