//! Morning day-plan packing.
//!
//! Pure scheduling helper: given wake-up and departure times plus a task
//! list, produces a minute-level plan with fixed buffers. Higher priority
//! first, shorter duration as the tie-breaker; tasks that would cross the
//! departure time are skipped with a warning.

const RISE_SLOT_MIN: u32 = 1;
const BUFFER_MIN: u32 = 5;

/// One task the user wants to fit before departure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerTask {
    pub title: String,
    pub duration_min: u32,
    /// 1 (lowest) to 5 (highest).
    pub priority: u8,
}

/// One placed slot of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    /// `HH:MM`.
    pub start: String,
    /// `HH:MM`.
    pub end: String,
    pub title: String,
    pub reason: String,
}

/// Result of a packing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPlan {
    pub slots: Vec<PlanSlot>,
    pub warnings: Vec<String>,
}

/// Packs tasks between wake-up and departure (both `HH:MM`).
pub fn build_morning_plan(wake_up: &str, departure: &str, tasks: &[PlannerTask]) -> DayPlan {
    let (Some(start), Some(end)) = (parse_hhmm(wake_up), parse_hhmm(departure)) else {
        return DayPlan {
            slots: Vec::new(),
            warnings: vec![
                "時刻のパースに失敗しました（起床/出発時刻を確認してください）。".to_string(),
            ],
        };
    };
    if end <= start {
        return DayPlan {
            slots: Vec::new(),
            warnings: vec!["出発時刻は起床時刻より後にしてください。".to_string()],
        };
    }

    let mut ordered: Vec<&PlannerTask> = tasks.iter().collect();
    ordered.sort_by_key(|task| (std::cmp::Reverse(task.priority), task.duration_min));

    let mut plan = DayPlan::default();
    let mut cursor = start;

    plan.slots.push(PlanSlot {
        start: format_hhmm(cursor),
        end: format_hhmm(cursor + RISE_SLOT_MIN),
        title: "起床".to_string(),
        reason: "一日の開始".to_string(),
    });
    cursor += RISE_SLOT_MIN + BUFFER_MIN;

    for task in ordered {
        if task.duration_min == 0 {
            continue;
        }
        if cursor + task.duration_min > end {
            plan.warnings.push(format!(
                "「{}」は出発時刻までに収まらないため除外しました。",
                task.title
            ));
            continue;
        }
        let slot_end = cursor + task.duration_min;
        plan.slots.push(PlanSlot {
            start: format_hhmm(cursor),
            end: format_hhmm(slot_end),
            title: task.title.clone(),
            reason: "ユーザー指定のタスク".to_string(),
        });
        cursor = slot_end + BUFFER_MIN;
    }

    plan
}

/// Minutes since midnight, or `None` for anything that is not `HH:MM`.
fn parse_hhmm(value: &str) -> Option<u32> {
    let (hours, minutes) = value.trim().split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

fn format_hhmm(total_minutes: u32) -> String {
    format!("{:02}:{:02}", (total_minutes / 60) % 24, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::{build_morning_plan, parse_hhmm, PlannerTask};

    fn task(title: &str, duration_min: u32, priority: u8) -> PlannerTask {
        PlannerTask {
            title: title.to_string(),
            duration_min,
            priority,
        }
    }

    #[test]
    fn parse_hhmm_bounds() {
        assert_eq!(parse_hhmm("07:30"), Some(450));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("7時半"), None);
    }

    #[test]
    fn plan_orders_by_priority_then_duration() {
        let plan = build_morning_plan(
            "07:00",
            "09:00",
            &[
                task("朝食", 20, 3),
                task("シャワー", 15, 5),
                task("ストレッチ", 10, 3),
            ],
        );
        let titles: Vec<&str> = plan.slots.iter().map(|slot| slot.title.as_str()).collect();
        assert_eq!(titles, ["起床", "シャワー", "ストレッチ", "朝食"]);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn slots_leave_five_minute_buffers() {
        let plan = build_morning_plan("07:00", "08:00", &[task("朝食", 20, 3)]);
        assert_eq!(plan.slots[0].start, "07:00");
        assert_eq!(plan.slots[0].end, "07:01");
        assert_eq!(plan.slots[1].start, "07:06");
        assert_eq!(plan.slots[1].end, "07:26");
    }

    #[test]
    fn overflowing_tasks_are_skipped_with_a_warning() {
        let plan = build_morning_plan(
            "07:00",
            "07:30",
            &[task("掃除", 40, 5), task("朝食", 15, 4)],
        );
        let titles: Vec<&str> = plan.slots.iter().map(|slot| slot.title.as_str()).collect();
        assert_eq!(titles, ["起床", "朝食"]);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.warnings[0].contains("掃除"));
    }

    #[test]
    fn unparsable_times_yield_an_empty_plan_with_warning() {
        let plan = build_morning_plan("朝", "09:00", &[]);
        assert!(plan.slots.is_empty());
        assert_eq!(plan.warnings.len(), 1);

        let inverted = build_morning_plan("09:00", "07:00", &[]);
        assert!(inverted.slots.is_empty());
    }
}
