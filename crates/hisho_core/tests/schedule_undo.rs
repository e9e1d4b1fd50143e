use hisho_core::db::open_db_in_memory;
use hisho_core::{
    AssistantError, AssistantService, CommandOutcome, CommandRequest, EntityRecord, Mode,
    Schedule, ScheduleStatus, SessionContext, UndoRequest, ValidationError,
};
use serde_json::{json, Value};
use uuid::Uuid;

fn service() -> AssistantService {
    AssistantService::new(open_db_in_memory().unwrap())
}

fn request(mode: i64, action: i64, data: Value) -> CommandRequest {
    CommandRequest { mode, action, data }
}

fn saved_schedule(outcome: CommandOutcome) -> Schedule {
    match outcome {
        CommandOutcome::Saved(EntityRecord::Schedule(schedule)) => schedule,
        other => panic!("expected saved schedule, got {other:?}"),
    }
}

fn read_schedule(
    service: &mut AssistantService,
    session: &SessionContext,
    id: Uuid,
) -> Option<Schedule> {
    match service
        .execute(session, &request(2, 4, json!({"id": id.to_string()})))
        .unwrap()
    {
        CommandOutcome::One(record) => record.map(|record| match record {
            EntityRecord::Schedule(schedule) => schedule,
            other => panic!("expected schedule record, got {other:?}"),
        }),
        other => panic!("expected single-entity read, got {other:?}"),
    }
}

#[test]
fn add_delete_undo_restores_identity_and_fields() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let created = saved_schedule(
        service
            .execute(
                &session,
                &request(
                    2,
                    1,
                    json!({
                        "title": "会議",
                        "datetime": "2025-10-30 14:00",
                        "items": ["資料"],
                    }),
                ),
            )
            .unwrap(),
    );
    assert_eq!(created.title, "会議");
    assert_eq!(created.status, ScheduleStatus::Active);

    service
        .execute(&session, &request(2, 3, Value::String(created.id.to_string())))
        .unwrap();
    assert!(read_schedule(&mut service, &session, created.id).is_none());

    service.undo(&session, &UndoRequest::default()).unwrap();
    let restored = read_schedule(&mut service, &session, created.id).unwrap();
    assert_eq!(restored, created);
}

#[test]
fn modify_then_undo_restores_the_exact_snapshot() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let created = saved_schedule(
        service
            .execute(
                &session,
                &request(
                    2,
                    1,
                    json!({
                        "title": "会議",
                        "datetime": "2025-10-30 14:00",
                        "items": ["資料", "ノート"],
                        "location": "会議室A",
                    }),
                ),
            )
            .unwrap(),
    );

    let modified = saved_schedule(
        service
            .execute(
                &session,
                &request(
                    2,
                    2,
                    json!({
                        "id": created.id.to_string(),
                        "title": "重要な会議",
                        "items": ["資料", "ノート", "パソコン"],
                    }),
                ),
            )
            .unwrap(),
    );
    assert_eq!(modified.title, "重要な会議");
    assert_eq!(modified.datetime, created.datetime);
    assert_eq!(modified.location, created.location);
    assert_eq!(modified.items.len(), 3);

    service.undo(&session, &UndoRequest::default()).unwrap();
    let restored = read_schedule(&mut service, &session, created.id).unwrap();
    assert_eq!(restored, created);
}

#[test]
fn add_then_undo_removes_the_schedule() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let created = saved_schedule(
        service
            .execute(
                &session,
                &request(2, 1, json!({"title": "散歩", "datetime": "2025-11-01 09:00"})),
            )
            .unwrap(),
    );

    service.undo(&session, &UndoRequest::default()).unwrap();
    assert!(read_schedule(&mut service, &session, created.id).is_none());
}

#[test]
fn modify_on_a_missing_id_recreates_the_record() {
    let mut service = service();
    let session = SessionContext::new("s1");
    let missing = Uuid::new_v4();

    let recreated = saved_schedule(
        service
            .execute(
                &session,
                &request(
                    2,
                    2,
                    json!({
                        "id": missing.to_string(),
                        "title": "復元された予定",
                        "datetime": "2025-12-01 10:00",
                    }),
                ),
            )
            .unwrap(),
    );
    assert_eq!(recreated.id, missing);
    assert_eq!(recreated.title, "復元された予定");

    // The fallback logs Delete(newId) as the inverse.
    service.undo(&session, &UndoRequest::default()).unwrap();
    assert!(read_schedule(&mut service, &session, missing).is_none());
}

#[test]
fn modify_fallback_without_required_fields_is_a_validation_error() {
    let mut service = service();
    let session = SessionContext::new("s1");

    let err = service
        .execute(&session, &request(2, 2, json!({"title": "だけ"})))
        .unwrap_err();
    assert!(matches!(
        err,
        AssistantError::Validation(ValidationError::MissingField("datetime"))
    ));
}

#[test]
fn delete_on_an_unknown_id_is_not_found() {
    let mut service = service();
    let session = SessionContext::new("s1");
    let missing = Uuid::new_v4();

    let err = service
        .execute(&session, &request(2, 3, Value::String(missing.to_string())))
        .unwrap_err();
    match err {
        AssistantError::NotFound {
            mode: Mode::Schedule,
            id: Some(id),
        } => assert_eq!(id, missing.to_string()),
        other => panic!("expected schedule not-found, got {other:?}"),
    }
}

#[test]
fn read_all_orders_by_datetime() {
    let mut service = service();
    let session = SessionContext::new("s1");

    for (title, datetime) in [
        ("later", "2025-12-02 10:00"),
        ("earlier", "2025-12-01 08:00"),
    ] {
        service
            .execute(
                &session,
                &request(2, 1, json!({"title": title, "datetime": datetime})),
            )
            .unwrap();
    }

    match service.execute(&session, &request(2, 4, Value::Null)).unwrap() {
        CommandOutcome::Many(records) => {
            let titles: Vec<String> = records
                .into_iter()
                .map(|record| match record {
                    EntityRecord::Schedule(schedule) => schedule.title,
                    other => panic!("expected schedule record, got {other:?}"),
                })
                .collect();
            assert_eq!(titles, ["earlier", "later"]);
        }
        other => panic!("expected collection read, got {other:?}"),
    }
}
