//! Fixed-pattern message router and canned assist replies.
//!
//! # Responsibility
//! - Map short free-text messages onto assistant intents by fixed prefix
//!   and keyword patterns. No natural-language understanding.
//!
//! # Invariants
//! - Pattern checks run in table order; the first match wins.
//! - Unrecognized messages fall through to the help intent.

use crate::flow::FlowType;
use crate::model::command::Mode;
use once_cell::sync::Lazy;
use regex::Regex;

static TEMPERATURE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-?\d+").expect("valid temperature regex"));

/// What a routed message asks the assistant to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    StartFlow(FlowType),
    Cancel,
    /// Undo, optionally scoped to one entity kind named in the message.
    Undo(Option<Mode>),
    ListSchedules,
    /// Forgotten-items check against the earliest schedule.
    Checklist,
    /// Clothing advice; `None` when no temperature was given.
    Clothing(Option<i32>),
    /// Morning day-plan request; arguments stay in the raw message.
    MorningPlan,
    Help,
}

/// Flow-start patterns, checked first and in order.
const FLOW_STARTERS: &[(&str, FlowType)] = &[
    ("プロフィール登録", FlowType::Profile),
    ("スケジュール登録", FlowType::Schedule),
    ("スケジュール作成", FlowType::Schedule),
    ("食事記録", FlowType::Meal),
];

/// Routes one free-text message onto an intent by fixed patterns.
pub fn route(message: &str) -> Intent {
    let message = message.trim();

    for (pattern, flow) in FLOW_STARTERS {
        if message.starts_with(pattern) {
            return Intent::StartFlow(*flow);
        }
    }

    if message.starts_with("キャンセル") {
        return Intent::Cancel;
    }

    if message.starts_with("元に戻す") || message.starts_with("アンドゥ") {
        return Intent::Undo(undo_scope(message));
    }

    if message.contains("忘れ物") {
        return Intent::Checklist;
    }

    if message.starts_with("朝の計画") {
        return Intent::MorningPlan;
    }

    if message.starts_with("服装") {
        let temperature = TEMPERATURE_RE
            .find(message)
            .and_then(|found| found.as_str().parse().ok());
        return Intent::Clothing(temperature);
    }

    if message.contains("予定") {
        return Intent::ListSchedules;
    }

    Intent::Help
}

fn undo_scope(message: &str) -> Option<Mode> {
    if message.contains("予定") || message.contains("スケジュール") {
        Some(Mode::Schedule)
    } else if message.contains("食事") {
        Some(Mode::Meal)
    } else if message.contains("プロフィール") {
        Some(Mode::Profile)
    } else {
        None
    }
}

/// Temperature-banded clothing advice, matching the original assistant.
pub fn clothing_advice(temperature_c: i32) -> &'static str {
    if temperature_c >= 30 {
        "とても暑いです。薄手の服、帽子、こまめな水分補給を。"
    } else if temperature_c >= 24 {
        "暑めです。半袖＋薄手の羽織が良いでしょう。"
    } else if temperature_c >= 18 {
        "快適な気温。長袖＋軽い上着が良いです。"
    } else if temperature_c >= 10 {
        "肌寒いです。ジャケットやセーターをおすすめします。"
    } else {
        "かなり寒いです。コート、マフラー、手袋など暖かくしてください。"
    }
}

/// Usage summary returned for unrecognized messages.
pub fn help_text() -> &'static str {
    "使い方:\n\
     ・プロフィール登録 / スケジュール登録 / 食事記録 — 対話形式で入力を開始\n\
     ・キャンセル — 進行中の入力を中止\n\
     ・元に戻す — 直前の操作を取り消し（「元に戻す 予定」のように対象を絞れます）\n\
     ・予定 — 予定の一覧\n\
     ・忘れ物 — 直近の予定の持ち物を確認\n\
     ・服装 22 — 気温に合わせた服装の提案\n\
     ・朝の計画 07:00 08:30 朝食:20:3 — 出発までの分刻みプラン"
}

#[cfg(test)]
mod tests {
    use super::{clothing_advice, route, Intent};
    use crate::flow::FlowType;
    use crate::model::command::Mode;

    #[test]
    fn flow_starters_route_to_their_flows() {
        assert_eq!(
            route("プロフィール登録"),
            Intent::StartFlow(FlowType::Profile)
        );
        assert_eq!(
            route("スケジュール作成 会議"),
            Intent::StartFlow(FlowType::Schedule)
        );
        assert_eq!(route("食事記録"), Intent::StartFlow(FlowType::Meal));
    }

    #[test]
    fn undo_scope_comes_from_the_message() {
        assert_eq!(route("元に戻す"), Intent::Undo(None));
        assert_eq!(route("元に戻す 予定"), Intent::Undo(Some(Mode::Schedule)));
        assert_eq!(route("元に戻す 食事"), Intent::Undo(Some(Mode::Meal)));
    }

    #[test]
    fn undo_with_schedule_word_is_not_a_listing() {
        // 「予定」 appears in the message, but the undo prefix wins.
        assert_ne!(route("元に戻す 予定"), Intent::ListSchedules);
    }

    #[test]
    fn clothing_requires_a_temperature() {
        assert_eq!(route("服装 22"), Intent::Clothing(Some(22)));
        assert_eq!(route("服装 -3"), Intent::Clothing(Some(-3)));
        assert_eq!(route("服装"), Intent::Clothing(None));
    }

    #[test]
    fn clothing_bands_match_the_original_thresholds() {
        assert!(clothing_advice(30).contains("とても暑い"));
        assert!(clothing_advice(24).contains("暑め"));
        assert!(clothing_advice(18).contains("快適"));
        assert!(clothing_advice(10).contains("肌寒い"));
        assert!(clothing_advice(-5).contains("かなり寒い"));
    }

    #[test]
    fn morning_plan_prefix_routes_to_the_planner() {
        assert_eq!(route("朝の計画 07:00 08:30"), Intent::MorningPlan);
    }

    #[test]
    fn unknown_messages_fall_through_to_help() {
        assert_eq!(route("こんにちは"), Intent::Help);
        assert_eq!(route("予定を見せて"), Intent::ListSchedules);
        assert_eq!(route("忘れ物ある？"), Intent::Checklist);
    }
}
