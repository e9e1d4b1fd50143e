//! Action log repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Append executed mutations with their inverses, per session.
//! - Select the most recent not-yet-undone entry for undo.
//!
//! # Invariants
//! - Rows are never edited except flipping `undone` from 0 to 1.
//! - `read` actions are never logged; append rejects them.

use crate::model::action::{ActionLogEntry, InverseCommand};
use crate::model::command::{ActionType, Mode};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, Row};
use serde_json::Value;

const LOG_SELECT_SQL: &str = "SELECT
    id,
    mode,
    action_type,
    payload,
    inverse,
    created_at,
    undone
FROM action_log";

const LOG_COLUMNS: &[&str] = &[
    "id",
    "session_key",
    "mode",
    "action_type",
    "payload",
    "inverse",
    "created_at",
    "undone",
];

/// Repository interface for the append-only action log.
pub trait ActionLogRepository {
    fn append(
        &self,
        session_key: &str,
        mode: Mode,
        action_type: ActionType,
        payload: &Value,
        inverse: Option<&InverseCommand>,
    ) -> RepoResult<i64>;
    fn latest_pending(
        &self,
        session_key: &str,
        mode: Option<Mode>,
    ) -> RepoResult<Option<ActionLogEntry>>;
    fn mark_undone(&self, entry_id: i64) -> RepoResult<()>;
}

/// SQLite-backed action log repository.
pub struct SqliteActionLogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteActionLogRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "action_log", LOG_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ActionLogRepository for SqliteActionLogRepository<'_> {
    fn append(
        &self,
        session_key: &str,
        mode: Mode,
        action_type: ActionType,
        payload: &Value,
        inverse: Option<&InverseCommand>,
    ) -> RepoResult<i64> {
        if action_type == ActionType::Read {
            return Err(RepoError::InvalidData(
                "read actions are never logged".to_string(),
            ));
        }

        let payload_text = serde_json::to_string(payload).map_err(|err| {
            RepoError::InvalidData(format!("failed to encode action payload: {err}"))
        })?;
        let inverse_text = match inverse {
            Some(inverse) => Some(serde_json::to_string(inverse).map_err(|err| {
                RepoError::InvalidData(format!("failed to encode action inverse: {err}"))
            })?),
            None => None,
        };

        self.conn.execute(
            "INSERT INTO action_log (session_key, mode, action_type, payload, inverse)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                session_key,
                mode.code(),
                action_type.code(),
                payload_text,
                inverse_text,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_pending(
        &self,
        session_key: &str,
        mode: Option<Mode>,
    ) -> RepoResult<Option<ActionLogEntry>> {
        let mut sql = format!("{LOG_SELECT_SQL} WHERE session_key = ? AND undone = 0");
        let mut bind_values: Vec<SqlValue> = vec![SqlValue::Text(session_key.to_string())];
        if let Some(mode) = mode {
            sql.push_str(" AND mode = ?");
            bind_values.push(SqlValue::Integer(mode.code()));
        }
        sql.push_str(" ORDER BY id DESC LIMIT 1;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_log_row(row)?));
        }
        Ok(None)
    }

    fn mark_undone(&self, entry_id: i64) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE action_log SET undone = 1 WHERE id = ?1 AND undone = 0;",
            [entry_id],
        )?;
        if changed == 0 {
            return Err(RepoError::InvalidData(format!(
                "action log entry {entry_id} is missing or already undone"
            )));
        }
        Ok(())
    }
}

fn parse_log_row(row: &Row<'_>) -> RepoResult<ActionLogEntry> {
    let mode_code: i64 = row.get("mode")?;
    let mode = Mode::from_code(mode_code).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid mode value `{mode_code}` in action_log.mode"))
    })?;

    let action_code: i64 = row.get("action_type")?;
    let action_type = ActionType::from_code(action_code)
        .filter(|action| *action != ActionType::Read)
        .ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid action value `{action_code}` in action_log.action_type"
            ))
        })?;

    let payload_text: String = row.get("payload")?;
    let payload: Value = serde_json::from_str(&payload_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid payload value `{payload_text}` in action_log.payload"
        ))
    })?;

    let inverse = match row.get::<_, Option<String>>("inverse")? {
        Some(text) => Some(serde_json::from_str::<InverseCommand>(&text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid inverse value `{text}` in action_log.inverse"
            ))
        })?),
        None => None,
    };

    let undone = match row.get::<_, i64>("undone")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid undone value `{other}` in action_log.undone"
            )));
        }
    };

    Ok(ActionLogEntry {
        id: row.get("id")?,
        mode,
        action_type,
        payload,
        inverse,
        created_at: row.get("created_at")?,
        undone,
    })
}
