//! Undo engine: selects the newest pending log entry and replays its inverse.
//!
//! # Invariants
//! - Only one entry is undone per call; repeated calls walk further back.
//! - A null-inverse entry fails `NoInverseAvailable` and stays un-undone;
//!   the engine never skips to an older entry on its own.
//! - Inverse replay goes through the regular command boundary and never
//!   appends a log entry (undo is not itself undoable).

use crate::model::action::InverseCommand;
use crate::model::command::{ActionType, Command, CommandRequest, Mode};
use crate::repo::action_log_repo::{ActionLogRepository, SqliteActionLogRepository};
use crate::service::executor::{CommandExecutor, CommandOutcome};
use crate::service::AssistantError;
use rusqlite::Connection;

/// What an undo call reverted.
#[derive(Debug)]
pub struct UndoOutcome {
    /// Log entry that was marked undone.
    pub entry_id: i64,
    /// Entity kind of the original action.
    pub mode: Mode,
    /// Action type of the original action.
    pub action_type: ActionType,
    /// Entity state produced by applying the inverse.
    pub outcome: CommandOutcome,
}

/// Undoes the most recent eligible action for the session, within the
/// caller's transaction so apply-inverse and mark-undone commit together.
pub(crate) fn undo_latest(
    conn: &Connection,
    session_key: &str,
    filter: Option<Mode>,
) -> Result<UndoOutcome, AssistantError> {
    let log = SqliteActionLogRepository::try_new(conn)?;
    let entry = log
        .latest_pending(session_key, filter)?
        .ok_or(AssistantError::NoActionAvailable { mode: filter })?;
    let inverse = entry
        .inverse
        .as_ref()
        .ok_or(AssistantError::NoInverseAvailable { entry_id: entry.id })?;

    let command = inverse_to_command(inverse)?;
    let applied = CommandExecutor::new(conn, session_key).apply(&command)?;
    log.mark_undone(entry.id)?;

    Ok(UndoOutcome {
        entry_id: entry.id,
        mode: entry.mode,
        action_type: entry.action_type,
        outcome: applied.outcome,
    })
}

/// Rebuilds the executor command described by a persisted inverse, through
/// the same boundary decoding as live commands so embedded ids and field
/// snapshots round-trip verbatim.
fn inverse_to_command(inverse: &InverseCommand) -> Result<Command, AssistantError> {
    let request = CommandRequest {
        mode: inverse.mode.code(),
        action: inverse.op.action_type().code(),
        data: inverse.data.clone(),
    };
    Ok(Command::parse(&request)?)
}
