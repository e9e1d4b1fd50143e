//! Step tables and answer validators for the guided flows.
//!
//! Each (flow, step) entry pairs the buffer field with its prompt, the
//! corrective re-prompt, and the validator that parses one user message.

use super::state::FlowType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const AGE_MAX: u32 = 150;
const CALORIES_MAX: u32 = 100_000;

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2})$").expect("valid datetime regex")
});

/// One step of a guided flow.
pub struct FlowStep {
    /// Buffer/payload field this step fills.
    pub field: &'static str,
    pub prompt: &'static str,
    pub reprompt: &'static str,
    /// Returns the parsed value, `Value::Null` for an accepted empty optional
    /// answer, or `None` when the message fails the step's grammar.
    pub parse: fn(&str) -> Option<Value>,
}

const PROFILE_STEPS: &[FlowStep] = &[
    FlowStep {
        field: "name",
        prompt: "お名前を教えてください。",
        reprompt: "お名前を入力してください。",
        parse: parse_required_text,
    },
    FlowStep {
        field: "age",
        prompt: "年齢を数字で入力してください。",
        reprompt: "年齢は 0〜150 の数字で入力してください。",
        parse: parse_age,
    },
    FlowStep {
        field: "region",
        prompt: "お住まいの地域を入力してください。",
        reprompt: "地域を入力してください。",
        parse: parse_required_text,
    },
];

const SCHEDULE_STEPS: &[FlowStep] = &[
    FlowStep {
        field: "title",
        prompt: "予定のタイトルを入力してください。",
        reprompt: "タイトルを入力してください。",
        parse: parse_required_text,
    },
    FlowStep {
        field: "datetime",
        prompt: "日時を入力してください（例: 2025-10-30 14:00）。",
        reprompt: "日時の形式が正しくありません。例: 2025-10-30 14:00",
        parse: parse_datetime,
    },
    FlowStep {
        field: "items",
        prompt: "持ち物をカンマ区切りで入力してください（なければ空のまま送信）。",
        reprompt: "持ち物をカンマ区切りで入力してください。",
        parse: parse_item_list,
    },
    FlowStep {
        field: "location",
        prompt: "場所を入力してください（なければ空のまま送信）。",
        reprompt: "場所を入力してください。",
        parse: parse_optional_text,
    },
];

const MEAL_STEPS: &[FlowStep] = &[
    FlowStep {
        field: "meal_type",
        prompt: "食事の種類を入力してください（朝食・昼食・夕食など）。",
        reprompt: "食事の種類を入力してください。",
        parse: parse_required_text,
    },
    FlowStep {
        field: "items",
        prompt: "食べたものを入力してください。",
        reprompt: "食べたものを入力してください。",
        parse: parse_required_text,
    },
    FlowStep {
        field: "calories",
        prompt: "カロリーを数字で入力してください（不明なら空のまま送信）。",
        reprompt: "カロリーは数字のみで入力してください（不明なら空のまま送信）。",
        parse: parse_calories,
    },
    FlowStep {
        field: "rating",
        prompt: "満足度を 1〜5 の数字で入力してください（任意）。",
        reprompt: "満足度は 1〜5 の数字ひとつで入力してください。",
        parse: parse_rating,
    },
];

/// The fixed, ordered step sequence of one flow.
pub fn steps_for(flow: FlowType) -> &'static [FlowStep] {
    match flow {
        FlowType::Profile => PROFILE_STEPS,
        FlowType::Schedule => SCHEDULE_STEPS,
        FlowType::Meal => MEAL_STEPS,
    }
}

fn parse_required_text(message: &str) -> Option<Value> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(Value::String(trimmed.to_string()))
}

fn parse_optional_text(message: &str) -> Option<Value> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    Some(Value::String(trimmed.to_string()))
}

fn parse_age(message: &str) -> Option<Value> {
    let age: u32 = message.trim().parse().ok()?;
    if age > AGE_MAX {
        return None;
    }
    Some(Value::from(age))
}

/// Accepts `YYYY-MM-DD HH:MM` with calendar-aware field ranges. The value is
/// stored as the opaque string the user typed.
fn parse_datetime(message: &str) -> Option<Value> {
    let trimmed = message.trim();
    let captures = DATETIME_RE.captures(trimmed)?;
    let year: u32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;
    let hour: u32 = captures[4].parse().ok()?;
    let minute: u32 = captures[5].parse().ok()?;

    if month == 0 || month > 12 || day == 0 || day > days_in_month(year, month) {
        return None;
    }
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(Value::String(trimmed.to_string()))
}

fn parse_item_list(message: &str) -> Option<Value> {
    let items: Vec<Value> = message
        .split([',', '、'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| Value::String(item.to_string()))
        .collect();
    Some(Value::Array(items))
}

fn parse_calories(message: &str) -> Option<Value> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    if !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    let calories: u32 = trimmed.parse().ok()?;
    if calories > CALORIES_MAX {
        return None;
    }
    Some(Value::from(calories))
}

fn parse_rating(message: &str) -> Option<Value> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Some(Value::Null);
    }
    if trimmed.len() != 1 {
        return None;
    }
    let rating: u32 = trimmed.parse().ok()?;
    if !(1..=5).contains(&rating) {
        return None;
    }
    Some(Value::from(rating))
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
