//! Use-case services and the assistant facade.
//!
//! # Responsibility
//! - Orchestrate command execution, undo and guided flows over the
//!   repository layer.
//! - Surface the typed error vocabulary of the command contract.
//!
//! # Invariants
//! - Entity mutation and log append commit together or not at all.
//! - Applying an inverse and marking its entry undone commit together.

use crate::model::command::{CommandError, Mode};
use crate::model::ValidationError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod assistant;
pub mod executor;
pub mod planner;
pub mod router;
pub mod undo;

/// Typed failure surface of the assistant core.
#[derive(Debug)]
pub enum AssistantError {
    /// A payload or flow answer failed a field-level check.
    Validation(ValidationError),
    /// The payload does not decode into the expected shape.
    Payload { mode: Mode, detail: String },
    /// Unknown `mode`/`type` combination, rejected before any mutation.
    Unsupported { mode: i64, action: Option<i64> },
    /// Modify/Delete target does not exist.
    NotFound { mode: Mode, id: Option<String> },
    /// Undo found no eligible log entry.
    NoActionAvailable { mode: Option<Mode> },
    /// The selected log entry carries no inverse; it stays un-undone.
    NoInverseAvailable { entry_id: i64 },
    /// A message arrived for a session with no active flow.
    NoActiveFlow,
    /// Write/read-back disagreement inside one transaction.
    Inconsistent(&'static str),
    /// Storage transport failure; the enclosing transaction rolled back.
    Storage(RepoError),
}

impl Display for AssistantError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Payload { mode, detail } => write!(f, "invalid {mode} payload: {detail}"),
            Self::Unsupported { mode, action } => match action {
                Some(action) => write!(f, "unsupported command: mode={mode} type={action}"),
                None => write!(f, "unsupported mode: {mode}"),
            },
            Self::NotFound { mode, id } => match id {
                Some(id) => write!(f, "{mode} not found: {id}"),
                None => write!(f, "{mode} not found"),
            },
            Self::NoActionAvailable { mode } => match mode {
                Some(mode) => write!(f, "no undoable {mode} action is available"),
                None => write!(f, "no undoable action is available"),
            },
            Self::NoInverseAvailable { entry_id } => {
                write!(f, "action log entry {entry_id} has no inverse to apply")
            }
            Self::NoActiveFlow => write!(f, "no guided flow is active for this session"),
            Self::Inconsistent(detail) => write!(f, "inconsistent store state: {detail}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AssistantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AssistantError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CommandError> for AssistantError {
    fn from(value: CommandError) -> Self {
        match value {
            CommandError::Unsupported { mode, action } => Self::Unsupported { mode, action },
            CommandError::Payload { mode, detail } => Self::Payload { mode, detail },
            CommandError::Validation(err) => Self::Validation(err),
        }
    }
}

impl From<RepoError> for AssistantError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for AssistantError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(RepoError::from(value))
    }
}
