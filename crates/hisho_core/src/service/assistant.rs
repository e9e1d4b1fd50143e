//! Assistant facade: transactions, flow orchestration and logging.
//!
//! # Responsibility
//! - Own the SQLite connection and wrap every mutating command in one
//!   transaction together with its action-log append.
//! - Drive guided flows and finalize them through the command boundary.
//!
//! # Invariants
//! - A failed finalize puts the flow back at its last step with the buffer
//!   intact, so the user can retry without data loss.
//! - Undo applies the inverse and marks the entry undone atomically.

use crate::flow::{advance, first_prompt, FlowOutcome, FlowState, FlowType};
use crate::model::command::{ActionType, Command, CommandRequest, Mode, UndoRequest};
use crate::model::schedule::Schedule;
use crate::repo::action_log_repo::{ActionLogRepository, SqliteActionLogRepository};
use crate::repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
use crate::service::executor::{CommandExecutor, CommandOutcome};
use crate::service::undo::{undo_latest, UndoOutcome};
use crate::service::AssistantError;
use crate::session::SessionContext;
use log::{info, warn};
use rusqlite::Connection;
use serde_json::Value;

/// What the caller should surface after feeding a message into a flow.
#[derive(Debug)]
pub enum FlowReply {
    /// Answer accepted; the next question.
    Prompt(&'static str),
    /// Answer rejected; corrective message, same step.
    Reprompt(&'static str),
    /// Flow finalized; the created entity.
    Completed { outcome: CommandOutcome },
}

/// Facade over executor, undo engine and flow engine.
pub struct AssistantService {
    conn: Connection,
}

impl AssistantService {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Decodes and executes one wire command for the session.
    pub fn execute(
        &mut self,
        session: &SessionContext,
        request: &CommandRequest,
    ) -> Result<CommandOutcome, AssistantError> {
        let command = Command::parse(request)?;
        self.run_command(session.key(), &command, &request.data)
    }

    /// Undoes the session's most recent eligible action.
    pub fn undo(
        &mut self,
        session: &SessionContext,
        request: &UndoRequest,
    ) -> Result<UndoOutcome, AssistantError> {
        let filter = match request.mode {
            Some(code) => Some(Mode::from_code(code).ok_or(AssistantError::Unsupported {
                mode: code,
                action: None,
            })?),
            None => None,
        };

        let tx = self.conn.transaction()?;
        match undo_latest(&tx, session.key(), filter) {
            Ok(outcome) => {
                tx.commit()?;
                info!(
                    "event=undo_applied module=service mode={} action={} entry_id={} status=ok",
                    outcome.mode, outcome.action_type, outcome.entry_id
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("event=undo_rejected module=service status=error error={err}");
                Err(err)
            }
        }
    }

    /// Starts a guided flow, unconditionally discarding any incomplete one.
    /// Returns the first question.
    pub fn start_flow(
        &mut self,
        session: &mut SessionContext,
        flow: FlowType,
    ) -> &'static str {
        if session.clear_flow() {
            info!(
                "event=flow_discarded module=service session={} status=ok",
                session.key()
            );
        }
        session.set_flow(FlowState::new(flow));
        info!(
            "event=flow_started module=service flow={} session={} status=ok",
            flow.label(),
            session.key()
        );
        first_prompt(flow)
    }

    /// Cancels the active flow, if any, without touching the store.
    pub fn cancel_flow(&mut self, session: &mut SessionContext) -> bool {
        let cancelled = session.clear_flow();
        if cancelled {
            info!(
                "event=flow_cancelled module=service session={} status=ok",
                session.key()
            );
        }
        cancelled
    }

    /// Feeds one user message into the session's active flow.
    pub fn handle_message(
        &mut self,
        session: &mut SessionContext,
        message: &str,
    ) -> Result<FlowReply, AssistantError> {
        let Some(state) = session.take_flow() else {
            return Err(AssistantError::NoActiveFlow);
        };

        match advance(state, message) {
            FlowOutcome::Continue { state, prompt } => {
                session.set_flow(state);
                Ok(FlowReply::Prompt(prompt))
            }
            FlowOutcome::Retry { state, reprompt } => {
                session.set_flow(state);
                Ok(FlowReply::Reprompt(reprompt))
            }
            FlowOutcome::Complete { mut state, data } => {
                let flow_type = state.flow_type();
                let request = CommandRequest {
                    mode: flow_type.mode().code(),
                    action: ActionType::Add.code(),
                    data,
                };
                let result = Command::parse(&request)
                    .map_err(AssistantError::from)
                    .and_then(|command| {
                        self.run_command(session.key(), &command, &request.data)
                    });
                match result {
                    Ok(outcome) => {
                        info!(
                            "event=flow_completed module=service flow={} session={} status=ok",
                            flow_type.label(),
                            session.key()
                        );
                        Ok(FlowReply::Completed { outcome })
                    }
                    Err(err) => {
                        // Back to the last question, buffer intact.
                        state.step_back();
                        session.set_flow(state);
                        Err(err)
                    }
                }
            }
        }
    }

    /// All schedules ordered by datetime, for listings.
    pub fn schedules(&self) -> Result<Vec<Schedule>, AssistantError> {
        Ok(SqliteScheduleRepository::try_new(&self.conn)?.list()?)
    }

    /// The earliest schedule, used by the forgotten-items checklist.
    pub fn next_schedule(&self) -> Result<Option<Schedule>, AssistantError> {
        Ok(self.schedules()?.into_iter().next())
    }

    fn run_command(
        &mut self,
        session_key: &str,
        command: &Command,
        payload: &Value,
    ) -> Result<CommandOutcome, AssistantError> {
        let mode = command.mode();
        let action = command.action_type();

        if action == ActionType::Read {
            let applied = CommandExecutor::new(&self.conn, session_key).apply(command)?;
            return Ok(applied.outcome);
        }

        let tx = self.conn.transaction()?;
        let result: Result<CommandOutcome, AssistantError> = (|| {
            let applied = CommandExecutor::new(&tx, session_key).apply(command)?;
            if applied.mutated {
                SqliteActionLogRepository::try_new(&tx)?.append(
                    session_key,
                    mode,
                    action,
                    payload,
                    applied.inverse.as_ref(),
                )?;
            }
            Ok(applied.outcome)
        })();

        match result {
            Ok(outcome) => {
                tx.commit()?;
                info!(
                    "event=command_applied module=service mode={mode} action={action} status=ok"
                );
                Ok(outcome)
            }
            Err(err) => {
                // Dropping the transaction rolls back both halves.
                warn!(
                    "event=command_rejected module=service mode={mode} action={action} status=error error={err}"
                );
                Err(err)
            }
        }
    }
}
