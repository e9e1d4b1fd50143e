use hisho_core::db::open_db_in_memory;
use hisho_core::{
    AssistantError, AssistantService, CommandOutcome, CommandRequest, EntityRecord, Mode,
    SessionContext, UndoRequest,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn service() -> AssistantService {
    AssistantService::new(open_db_in_memory().unwrap())
}

fn request(mode: i64, action: i64, data: Value) -> CommandRequest {
    CommandRequest { mode, action, data }
}

fn add_schedule(service: &mut AssistantService, session: &SessionContext, title: &str) -> Uuid {
    match service
        .execute(
            session,
            &request(2, 1, json!({"title": title, "datetime": "2025-10-30 14:00"})),
        )
        .unwrap()
    {
        CommandOutcome::Saved(EntityRecord::Schedule(schedule)) => schedule.id,
        other => panic!("expected saved schedule, got {other:?}"),
    }
}

fn add_meal(service: &mut AssistantService, session: &SessionContext, items: &str) -> Uuid {
    match service
        .execute(session, &request(5, 1, json!({"meal_type": "昼食", "items": items})))
        .unwrap()
    {
        CommandOutcome::Saved(EntityRecord::Meal(meal)) => meal.id,
        other => panic!("expected saved meal, got {other:?}"),
    }
}

fn exists(service: &mut AssistantService, session: &SessionContext, mode: i64, id: Uuid) -> bool {
    match service
        .execute(session, &request(mode, 4, json!({"id": id.to_string()})))
        .unwrap()
    {
        CommandOutcome::One(record) => record.is_some(),
        other => panic!("expected single-entity read, got {other:?}"),
    }
}

#[test]
fn consecutive_undos_walk_backwards_most_recent_first() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let schedule_id = add_schedule(&mut service, &session, "会議");
    let meal_id = add_meal(&mut service, &session, "カレー");

    let first = service.undo(&session, &UndoRequest::default()).unwrap();
    assert_eq!(first.mode, Mode::Meal);
    assert!(!exists(&mut service, &session, 5, meal_id));
    assert!(exists(&mut service, &session, 2, schedule_id));

    let second = service.undo(&session, &UndoRequest::default()).unwrap();
    assert_eq!(second.mode, Mode::Schedule);
    assert!(!exists(&mut service, &session, 2, schedule_id));

    let err = service.undo(&session, &UndoRequest::default()).unwrap_err();
    assert!(matches!(
        err,
        AssistantError::NoActionAvailable { mode: None }
    ));
}

#[test]
fn undo_entry_ids_decrease_across_calls() {
    let mut service = service();
    let session = SessionContext::new("s1");

    add_schedule(&mut service, &session, "one");
    add_schedule(&mut service, &session, "two");

    let first = service.undo(&session, &UndoRequest::default()).unwrap();
    let second = service.undo(&session, &UndoRequest::default()).unwrap();
    assert!(first.entry_id > second.entry_id);
}

#[test]
fn mode_filter_skips_other_entity_kinds() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let schedule_id = add_schedule(&mut service, &session, "会議");
    let meal_id = add_meal(&mut service, &session, "カレー");

    // The meal add is newer, but the filter targets schedules.
    let outcome = service
        .undo(&session, &UndoRequest { mode: Some(2) })
        .unwrap();
    assert_eq!(outcome.mode, Mode::Schedule);
    assert!(!exists(&mut service, &session, 2, schedule_id));
    assert!(exists(&mut service, &session, 5, meal_id));
}

#[test]
fn filter_with_no_matching_entries_fails() {
    let mut service = service();
    let session = SessionContext::new("s1");

    add_schedule(&mut service, &session, "会議");

    let err = service
        .undo(&session, &UndoRequest { mode: Some(5) })
        .unwrap_err();
    assert!(matches!(
        err,
        AssistantError::NoActionAvailable {
            mode: Some(Mode::Meal),
        }
    ));
}

#[test]
fn an_unknown_filter_code_is_rejected() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let err = service
        .undo(&session, &UndoRequest { mode: Some(9) })
        .unwrap_err();
    assert!(matches!(
        err,
        AssistantError::Unsupported {
            mode: 9,
            action: None,
        }
    ));
}

#[test]
fn undo_is_not_itself_undoable() {
    let mut service = service();
    let session = SessionContext::new("s1");

    add_schedule(&mut service, &session, "会議");
    service.undo(&session, &UndoRequest::default()).unwrap();

    // No redo: the undo did not append a new entry.
    let err = service.undo(&session, &UndoRequest::default()).unwrap_err();
    assert!(matches!(err, AssistantError::NoActionAvailable { .. }));
}

#[test]
fn reads_are_never_logged() {
    let mut service = service();
    let session = SessionContext::new("s1");

    service
        .execute(&session, &request(2, 4, Value::Null))
        .unwrap();
    service
        .execute(&session, &request(1, 4, Value::Null))
        .unwrap();

    let err = service.undo(&session, &UndoRequest::default()).unwrap_err();
    assert!(matches!(err, AssistantError::NoActionAvailable { .. }));
}

#[test]
fn a_null_inverse_entry_fails_and_is_never_skipped() {
    use hisho_core::repo::action_log_repo::{ActionLogRepository, SqliteActionLogRepository};
    use hisho_core::ActionType;

    let conn = open_db_in_memory().unwrap();
    {
        let log = SqliteActionLogRepository::try_new(&conn).unwrap();
        log.append("s1", Mode::Schedule, ActionType::Add, &json!({}), None)
            .unwrap();
    }

    let mut service = AssistantService::new(conn);
    let session = SessionContext::new("s1");

    let err = service.undo(&session, &UndoRequest::default()).unwrap_err();
    assert!(matches!(
        err,
        AssistantError::NoInverseAvailable { .. }
    ));

    // The entry stays un-undone; the engine does not fall back to an older
    // entry, so the same failure repeats.
    let err = service.undo(&session, &UndoRequest::default()).unwrap_err();
    assert!(matches!(err, AssistantError::NoInverseAvailable { .. }));
}

#[test]
fn undo_only_sees_the_calling_sessions_actions() {
    let mut service = service();
    let owner = SessionContext::new("owner");
    let other = SessionContext::new("other");

    let schedule_id = add_schedule(&mut service, &owner, "会議");

    // The entity is shared, but the log entry belongs to its session.
    assert!(exists(&mut service, &other, 2, schedule_id));
    let err = service.undo(&other, &UndoRequest::default()).unwrap_err();
    assert!(matches!(err, AssistantError::NoActionAvailable { .. }));

    service.undo(&owner, &UndoRequest::default()).unwrap();
    assert!(!exists(&mut service, &owner, 2, schedule_id));
}
