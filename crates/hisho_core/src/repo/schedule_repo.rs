//! Schedule repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `schedules` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `items` persists as a JSON array column.
//! - Insert honors caller-supplied timestamps (inverse replay) and otherwise
//!   defers to the store clock.

use crate::model::schedule::{Schedule, ScheduleDraft, ScheduleId, ScheduleStatus};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const SCHEDULE_SELECT_SQL: &str = "SELECT
    id,
    title,
    datetime,
    location,
    items_json,
    status,
    alarm,
    created_at,
    updated_at
FROM schedules";

const SCHEDULE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "datetime",
    "location",
    "items_json",
    "status",
    "alarm",
    "created_at",
    "updated_at",
];

/// Repository interface for schedule CRUD operations.
pub trait ScheduleRepository {
    fn insert(&self, id: ScheduleId, draft: &ScheduleDraft) -> RepoResult<()>;
    /// Full-row update. `keep_timestamps` preserves `updated_at` verbatim
    /// (inverse replay); otherwise the store clock refreshes it.
    fn update(&self, schedule: &Schedule, keep_timestamps: bool) -> RepoResult<()>;
    fn get(&self, id: ScheduleId) -> RepoResult<Option<Schedule>>;
    fn list(&self) -> RepoResult<Vec<Schedule>>;
    fn delete(&self, id: ScheduleId) -> RepoResult<()>;
}

/// SQLite-backed schedule repository.
pub struct SqliteScheduleRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteScheduleRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "schedules", SCHEDULE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ScheduleRepository for SqliteScheduleRepository<'_> {
    fn insert(&self, id: ScheduleId, draft: &ScheduleDraft) -> RepoResult<()> {
        let items_json = encode_items(&draft.items)?;
        self.conn.execute(
            "INSERT INTO schedules (
                id,
                title,
                datetime,
                location,
                items_json,
                status,
                alarm,
                created_at,
                updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                COALESCE(?8, strftime('%s', 'now') * 1000),
                COALESCE(?9, strftime('%s', 'now') * 1000)
            );",
            params![
                id.to_string(),
                draft.title.as_str(),
                draft.datetime.as_str(),
                draft.location.as_deref(),
                items_json,
                draft.status.unwrap_or(ScheduleStatus::Active).as_db(),
                draft.alarm,
                draft.created_at,
                draft.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update(&self, schedule: &Schedule, keep_timestamps: bool) -> RepoResult<()> {
        let items_json = encode_items(&schedule.items)?;
        let updated_at_override = keep_timestamps.then_some(schedule.updated_at);
        let changed = self.conn.execute(
            "UPDATE schedules
             SET
                title = ?2,
                datetime = ?3,
                location = ?4,
                items_json = ?5,
                status = ?6,
                alarm = ?7,
                created_at = ?8,
                updated_at = COALESCE(?9, strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                schedule.id.to_string(),
                schedule.title.as_str(),
                schedule.datetime.as_str(),
                schedule.location.as_deref(),
                items_json,
                schedule.status.as_db(),
                schedule.alarm,
                schedule.created_at,
                updated_at_override,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(schedule.id.to_string()));
        }
        Ok(())
    }

    fn get(&self, id: ScheduleId) -> RepoResult<Option<Schedule>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SCHEDULE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_schedule_row(row)?));
        }
        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<Schedule>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SCHEDULE_SELECT_SQL} ORDER BY datetime ASC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut schedules = Vec::new();
        while let Some(row) = rows.next()? {
            schedules.push(parse_schedule_row(row)?);
        }
        Ok(schedules)
    }

    fn delete(&self, id: ScheduleId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM schedules WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn encode_items(items: &[String]) -> RepoResult<String> {
    serde_json::to_string(items)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode schedule items: {err}")))
}

fn parse_schedule_row(row: &Row<'_>) -> RepoResult<Schedule> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in schedules.id"))
    })?;

    let items_json: String = row.get("items_json")?;
    let items: Vec<String> = serde_json::from_str(&items_json).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid items value `{items_json}` in schedules.items_json"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = ScheduleStatus::parse_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status value `{status_text}` in schedules.status"
        ))
    })?;

    Ok(Schedule {
        id,
        title: row.get("title")?,
        datetime: row.get("datetime")?,
        location: row.get("location")?,
        items,
        status,
        alarm: row.get("alarm")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
