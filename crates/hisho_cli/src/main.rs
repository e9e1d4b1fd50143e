//! Interactive terminal front-end for the assistant core.
//!
//! # Responsibility
//! - Drive the command, flow and undo engines from a line-based chat loop.
//! - Resolve db path and logging settings from `HISHO_*` environment
//!   variables.

use hisho_core::db::open_db;
use hisho_core::service::planner::{build_morning_plan, PlannerTask};
use hisho_core::service::router::{self, Intent};
use hisho_core::{
    AssistantService, CommandOutcome, EntityRecord, FlowReply, SessionContext, UndoRequest,
};
use std::io::{self, BufRead, Write};

fn main() {
    let level = std::env::var("HISHO_LOG_LEVEL")
        .unwrap_or_else(|_| hisho_core::default_log_level().to_string());
    if let Ok(log_dir) = std::env::var("HISHO_LOG_DIR") {
        if let Err(err) = hisho_core::init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let db_path = std::env::var("HISHO_DB").unwrap_or_else(|_| "hisho.db".to_string());
    let conn = match open_db(&db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open database `{db_path}`: {err}");
            std::process::exit(1);
        }
    };

    let mut service = AssistantService::new(conn);
    let mut session = SessionContext::new("cli");

    println!(
        "hisho {} — ご用件をどうぞ（「終了」で終了）",
        hisho_core::core_version()
    );
    println!("{}", router::help_text());

    let stdin = io::stdin();
    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit" | "終了") {
            break;
        }
        println!("{}", handle_line(&mut service, &mut session, line));
    }
}

fn handle_line(service: &mut AssistantService, session: &mut SessionContext, line: &str) -> String {
    // While a flow runs, everything except cancel is an answer.
    if session.flow().is_some() {
        if router::route(line) == Intent::Cancel {
            service.cancel_flow(session);
            return "入力を中止しました。".to_string();
        }
        return match service.handle_message(session, line) {
            Ok(FlowReply::Prompt(prompt)) | Ok(FlowReply::Reprompt(prompt)) => prompt.to_string(),
            Ok(FlowReply::Completed { outcome }) => describe_saved(&outcome),
            Err(err) => format!("エラー: {err}"),
        };
    }

    match router::route(line) {
        Intent::StartFlow(flow) => service.start_flow(session, flow).to_string(),
        Intent::Cancel => "進行中の入力はありません。".to_string(),
        Intent::Undo(filter) => {
            let request = UndoRequest {
                mode: filter.map(|mode| mode.code()),
            };
            match service.undo(session, &request) {
                Ok(outcome) => format!(
                    "直前の操作（{} {}）を取り消しました。",
                    outcome.mode, outcome.action_type
                ),
                Err(err) => format!("エラー: {err}"),
            }
        }
        Intent::ListSchedules => match service.schedules() {
            Ok(schedules) if schedules.is_empty() => "予定はありません。".to_string(),
            Ok(schedules) => {
                let lines: Vec<String> = schedules
                    .iter()
                    .map(|schedule| format!("{} — {}", schedule.title, schedule.datetime))
                    .collect();
                format!("予定一覧:\n{}", lines.join("\n"))
            }
            Err(err) => format!("エラー: {err}"),
        },
        Intent::Checklist => match service.next_schedule() {
            Ok(None) => "直近の予定が見つかりません。".to_string(),
            Ok(Some(schedule)) if schedule.items.is_empty() => format!(
                "直近の予定「{}」には持ち物が登録されていません。",
                schedule.title
            ),
            Ok(Some(schedule)) => format!(
                "直近の予定「{}」の持ち物: {}",
                schedule.title,
                schedule.items.join(", ")
            ),
            Err(err) => format!("エラー: {err}"),
        },
        Intent::Clothing(Some(temperature)) => format!(
            "気温 {temperature}°C の服装提案: {}",
            router::clothing_advice(temperature)
        ),
        Intent::Clothing(None) => "気温を数字で指定してください（例: 服装 22）。".to_string(),
        Intent::MorningPlan => morning_plan_reply(line),
        Intent::Help => router::help_text().to_string(),
    }
}

fn describe_saved(outcome: &CommandOutcome) -> String {
    match outcome {
        CommandOutcome::Saved(EntityRecord::Schedule(schedule)) => format!(
            "スケジュールを作成しました: {} @ {} (id: {})",
            schedule.title, schedule.datetime, schedule.id
        ),
        CommandOutcome::Saved(EntityRecord::Meal(meal)) => format!(
            "食事を記録しました: {} — {}{}",
            meal.meal_type,
            meal.items,
            meal.calories
                .map(|calories| format!(" ({calories} kcal)"))
                .unwrap_or_default()
        ),
        CommandOutcome::Saved(EntityRecord::Profile(_)) => {
            "プロフィールを登録しました。".to_string()
        }
        _ => "登録しました。".to_string(),
    }
}

fn morning_plan_reply(line: &str) -> String {
    let rest = line.trim_start_matches("朝の計画").trim();
    let mut tokens = rest.split_whitespace();
    let (Some(wake_up), Some(departure)) = (tokens.next(), tokens.next()) else {
        return "使い方: 朝の計画 07:00 08:30 朝食:20:3 シャワー:15:5".to_string();
    };

    let tasks: Vec<PlannerTask> = tokens.filter_map(parse_task_token).collect();
    let plan = build_morning_plan(wake_up, departure, &tasks);

    let mut lines: Vec<String> = plan
        .slots
        .iter()
        .map(|slot| format!("{} - {} {}", slot.start, slot.end, slot.title))
        .collect();
    lines.extend(plan.warnings.iter().map(|warning| format!("注意: {warning}")));
    lines.join("\n")
}

/// `タイトル:分[:優先度]`; the priority defaults to 3.
fn parse_task_token(token: &str) -> Option<PlannerTask> {
    let mut parts = token.split(':');
    let title = parts.next()?.trim();
    if title.is_empty() {
        return None;
    }
    let duration_min = parts.next()?.trim().parse().ok()?;
    let priority = parts
        .next()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(3);
    Some(PlannerTask {
        title: title.to_string(),
        duration_min,
        priority,
    })
}
