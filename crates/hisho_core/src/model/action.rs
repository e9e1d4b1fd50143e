//! Action log entry and inverse command types.
//!
//! # Invariants
//! - Log entries are append-only; only the `undone` flag ever changes,
//!   monotonically false→true.
//! - An entry's inverse, when executed, restores the entity store to its
//!   state immediately before the original action.

use crate::model::command::{ActionType, Mode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation selector inside a persisted inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InverseOp {
    Add,
    Update,
    Delete,
}

impl InverseOp {
    /// Maps the inverse operation onto the executor action it replays as.
    pub fn action_type(self) -> ActionType {
        match self {
            Self::Add => ActionType::Add,
            Self::Update => ActionType::Modify,
            Self::Delete => ActionType::Delete,
        }
    }
}

/// A command description that undoes one logged action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InverseCommand {
    pub op: InverseOp,
    pub mode: Mode,
    pub data: Value,
}

impl InverseCommand {
    pub fn add(mode: Mode, data: Value) -> Self {
        Self {
            op: InverseOp::Add,
            mode,
            data,
        }
    }

    pub fn update(mode: Mode, data: Value) -> Self {
        Self {
            op: InverseOp::Update,
            mode,
            data,
        }
    }

    pub fn delete(mode: Mode, data: Value) -> Self {
        Self {
            op: InverseOp::Delete,
            mode,
            data,
        }
    }
}

/// One durable row of the action log.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionLogEntry {
    /// Monotonic sequence id assigned by the store.
    pub id: i64,
    pub mode: Mode,
    pub action_type: ActionType,
    /// The command's input data as received at the boundary.
    pub payload: Value,
    /// Absent means the action was logged but can never be undone.
    pub inverse: Option<InverseCommand>,
    /// Append timestamp in epoch milliseconds.
    pub created_at: i64,
    pub undone: bool,
}
