use hisho_core::db::open_db_in_memory;
use hisho_core::{
    AssistantError, AssistantService, CommandOutcome, CommandRequest, EntityRecord, FlowReply,
    FlowType, SessionContext, UndoRequest,
};
use serde_json::Value;

fn service() -> AssistantService {
    AssistantService::new(open_db_in_memory().unwrap())
}

fn answer(
    service: &mut AssistantService,
    session: &mut SessionContext,
    message: &str,
) -> FlowReply {
    service.handle_message(session, message).unwrap()
}

#[test]
fn schedule_flow_creates_one_schedule_after_four_valid_answers() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    let prompt = service.start_flow(&mut session, FlowType::Schedule);
    assert!(prompt.contains("タイトル"));

    assert!(matches!(
        answer(&mut service, &mut session, "会議"),
        FlowReply::Prompt(_)
    ));
    assert!(matches!(
        answer(&mut service, &mut session, "2025-10-30 14:00"),
        FlowReply::Prompt(_)
    ));
    assert!(matches!(
        answer(&mut service, &mut session, "資料, ノート"),
        FlowReply::Prompt(_)
    ));

    match answer(&mut service, &mut session, "会議室A") {
        FlowReply::Completed {
            outcome: CommandOutcome::Saved(EntityRecord::Schedule(schedule)),
        } => {
            assert_eq!(schedule.title, "会議");
            assert_eq!(schedule.datetime, "2025-10-30 14:00");
            assert_eq!(schedule.items, ["資料", "ノート"]);
            assert_eq!(schedule.location.as_deref(), Some("会議室A"));
        }
        other => panic!("expected completed schedule flow, got {other:?}"),
    }

    assert!(session.flow().is_none());
    assert_eq!(service.schedules().unwrap().len(), 1);
}

#[test]
fn invalid_datetime_keeps_the_flow_at_step_two_and_creates_nothing() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Schedule);
    answer(&mut service, &mut session, "会議");
    assert_eq!(session.flow().unwrap().step(), 1);

    match answer(&mut service, &mut session, "あした") {
        FlowReply::Reprompt(reprompt) => assert!(reprompt.contains("2025-10-30 14:00")),
        other => panic!("expected reprompt, got {other:?}"),
    }
    assert_eq!(session.flow().unwrap().step(), 1);
    assert!(service.schedules().unwrap().is_empty());
}

#[test]
fn cancel_discards_the_flow_without_creating_anything() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Schedule);
    answer(&mut service, &mut session, "会議");
    answer(&mut service, &mut session, "2025-10-30 14:00");

    assert!(service.cancel_flow(&mut session));
    assert!(session.flow().is_none());
    assert!(service.schedules().unwrap().is_empty());
    assert!(!service.cancel_flow(&mut session));
}

#[test]
fn starting_a_new_flow_discards_the_previous_one() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Schedule);
    answer(&mut service, &mut session, "会議");

    let prompt = service.start_flow(&mut session, FlowType::Profile);
    assert!(prompt.contains("お名前"));
    assert_eq!(session.flow().unwrap().flow_type(), FlowType::Profile);
    assert_eq!(session.flow().unwrap().step(), 0);

    answer(&mut service, &mut session, "山田太郎");
    answer(&mut service, &mut session, "30");
    match answer(&mut service, &mut session, "東京") {
        FlowReply::Completed {
            outcome: CommandOutcome::Saved(EntityRecord::Profile(profile)),
        } => {
            assert_eq!(profile.name.as_deref(), Some("山田太郎"));
            assert_eq!(profile.age, Some(30));
            assert_eq!(profile.region.as_deref(), Some("東京"));
        }
        other => panic!("expected completed profile flow, got {other:?}"),
    }

    // The abandoned schedule flow never produced an entity.
    assert!(service.schedules().unwrap().is_empty());
}

#[test]
fn meal_flow_accepts_empty_optional_answers() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Meal);
    answer(&mut service, &mut session, "昼食");
    answer(&mut service, &mut session, "カレー");
    answer(&mut service, &mut session, "");

    match answer(&mut service, &mut session, "") {
        FlowReply::Completed {
            outcome: CommandOutcome::Saved(EntityRecord::Meal(meal)),
        } => {
            assert_eq!(meal.meal_type, "昼食");
            assert_eq!(meal.items, "カレー");
            assert_eq!(meal.calories, None);
            assert_eq!(meal.rating, None);
            assert!(!meal.date.is_empty());
        }
        other => panic!("expected completed meal flow, got {other:?}"),
    }
}

#[test]
fn meal_flow_rejects_non_numeric_calories_and_bad_ratings() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Meal);
    answer(&mut service, &mut session, "夕食");
    answer(&mut service, &mut session, "焼き魚");

    assert!(matches!(
        answer(&mut service, &mut session, "たくさん"),
        FlowReply::Reprompt(_)
    ));
    assert_eq!(session.flow().unwrap().step(), 2);

    answer(&mut service, &mut session, "500");
    assert!(matches!(
        answer(&mut service, &mut session, "7"),
        FlowReply::Reprompt(_)
    ));
    assert!(matches!(
        answer(&mut service, &mut session, "4"),
        FlowReply::Completed { .. }
    ));
}

#[test]
fn profile_flow_rejects_out_of_range_age() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Profile);
    answer(&mut service, &mut session, "山田太郎");

    assert!(matches!(
        answer(&mut service, &mut session, "二百"),
        FlowReply::Reprompt(_)
    ));
    assert!(matches!(
        answer(&mut service, &mut session, "200"),
        FlowReply::Reprompt(_)
    ));
    assert_eq!(session.flow().unwrap().step(), 1);
}

#[test]
fn a_finalized_flow_is_undoable_like_any_add() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Schedule);
    answer(&mut service, &mut session, "会議");
    answer(&mut service, &mut session, "2025-10-30 14:00");
    answer(&mut service, &mut session, "");
    answer(&mut service, &mut session, "");

    assert_eq!(service.schedules().unwrap().len(), 1);
    service.undo(&session, &UndoRequest::default()).unwrap();
    assert!(service.schedules().unwrap().is_empty());
}

#[test]
fn a_message_without_an_active_flow_is_a_typed_error() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    let err = service.handle_message(&mut session, "会議").unwrap_err();
    assert!(matches!(err, AssistantError::NoActiveFlow));
}

#[test]
fn direct_commands_still_work_while_a_flow_is_active() {
    let mut service = service();
    let mut session = SessionContext::new("s1");

    service.start_flow(&mut session, FlowType::Meal);
    answer(&mut service, &mut session, "昼食");

    // A structured command does not disturb the flow buffer.
    let request = CommandRequest {
        mode: 2,
        action: 4,
        data: Value::Null,
    };
    service.execute(&session, &request).unwrap();
    assert_eq!(session.flow().unwrap().step(), 1);
}
