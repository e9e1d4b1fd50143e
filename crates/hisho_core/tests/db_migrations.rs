use hisho_core::db::migrations::latest_version;
use hisho_core::db::{open_db, open_db_in_memory};
use hisho_core::repo::schedule_repo::SqliteScheduleRepository;
use hisho_core::RepoError;
use rusqlite::Connection;

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

#[test]
fn in_memory_open_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(user_version(&conn), latest_version());
    assert!(latest_version() > 0);
}

#[test]
fn all_core_tables_exist_after_migration() {
    let conn = open_db_in_memory().unwrap();
    for table in ["profiles", "schedules", "meals", "action_log"] {
        let exists: i64 = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1);",
                [table],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(exists, 1, "table {table} should exist");
    }
}

#[test]
fn reopening_a_file_database_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("assistant.db");

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), latest_version());
}

#[test]
fn repositories_reject_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteScheduleRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repositories_reject_connections_missing_their_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    match SqliteScheduleRepository::try_new(&conn) {
        Err(RepoError::MissingRequiredTable("schedules")) => {}
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected missing table error"),
    }
}

#[test]
fn repositories_reject_connections_missing_a_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE schedules (
            id TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    match SqliteScheduleRepository::try_new(&conn) {
        Err(RepoError::MissingRequiredColumn {
            table: "schedules",
            column,
        }) => assert_eq!(column, "datetime"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected missing column error"),
    }
}
