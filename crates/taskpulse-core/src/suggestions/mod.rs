//! Prioritization suggestions derived from pressure and conflicts.
//!
//! Rules are evaluated in a fixed order and each one emits at most one
//! suggestion; the emission order is the priority order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{find_conflicts, ConflictWindow};
use crate::pressure::{classify_all, PressureClassification, PressureLevel};
use crate::task::{Task, TaskRef};

/// Example tasks carried by a single suggestion.
pub const MAX_EXAMPLES: usize = 3;

/// Pressure ratio above which a HIGH task is flagged as under-budgeted.
const TIGHT_RATIO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    Critical,
    Warning,
    Info,
    Suggestion,
}

/// What the host should offer the user to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    ReviewOverdue,
    FocusCritical,
    RebalanceWindow,
    ReassessEstimates,
    FollowOrder,
}

/// A prioritization hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionType,
    pub title: String,
    pub message: String,
    pub action: SuggestedAction,
    pub tasks: Vec<TaskRef>,
    /// 1 = most important
    pub priority_order: u32,
}

/// Active tasks sorted by `(level desc, urgency desc)`.
///
/// The sort is stable, so ties keep their input order.
pub fn rank_active<'a>(
    classified: &'a [(&'a Task, PressureClassification)],
) -> Vec<&'a (&'a Task, PressureClassification)> {
    let mut active: Vec<_> = classified.iter().filter(|(t, _)| !t.completed).collect();
    active.sort_by(|(_, a), (_, b)| {
        b.level
            .cmp(&a.level)
            .then_with(|| b.urgency.cmp(&a.urgency))
    });
    active
}

/// Classify, detect conflicts and build suggestions in one go.
pub fn suggest(tasks: &[Task], now: DateTime<Utc>) -> Vec<Suggestion> {
    let classified = classify_all(tasks, now);
    let conflicts = find_conflicts(tasks, now);
    build_suggestions(&classified, &conflicts)
}

/// Build the ordered suggestion list from precomputed inputs.
pub fn build_suggestions(
    classified: &[(&Task, PressureClassification)],
    conflicts: &[ConflictWindow],
) -> Vec<Suggestion> {
    let ranked = rank_active(classified);
    let mut out = Vec::new();

    let overdue: Vec<&Task> = tasks_at(&ranked, PressureLevel::Overdue);
    if !overdue.is_empty() {
        out.push(draft(
            SuggestionType::Critical,
            "Overdue tasks",
            format!(
                "You have {} overdue {}: {}",
                overdue.len(),
                plural(overdue.len(), "task"),
                example_list(&overdue)
            ),
            SuggestedAction::ReviewOverdue,
            &overdue,
        ));
    }

    let critical: Vec<&Task> = tasks_at(&ranked, PressureLevel::Critical);
    if critical.len() >= 2 {
        out.push(draft(
            SuggestionType::Warning,
            "Multiple critical deadlines",
            format!(
                "{} tasks are due within 6 hours. Finish \"{}\" first, then move down the list.",
                critical.len(),
                critical[0].content
            ),
            SuggestedAction::FocusCritical,
            &critical,
        ));
    }

    if let Some(worst) = conflicts
        .iter()
        .max_by(|a, b| a.overcommitment_ratio.total_cmp(&b.overcommitment_ratio))
    {
        let mut s = draft(
            SuggestionType::Warning,
            &format!("Overcommitted {}", worst.window.label()),
            format!(
                "{} minutes of estimated work against {} available minutes ({:.1}x). Consider moving a deadline or dropping scope.",
                worst.total_estimated_minutes, worst.available_minutes, worst.overcommitment_ratio
            ),
            SuggestedAction::RebalanceWindow,
            &[],
        );
        s.tasks = worst.tasks.iter().take(MAX_EXAMPLES).cloned().collect();
        out.push(s);
    }

    let tight: Vec<&Task> = ranked
        .iter()
        .filter(|(_, c)| c.level == PressureLevel::High)
        .filter(|(_, c)| c.pressure_ratio.is_some_and(|r| r > TIGHT_RATIO))
        .map(|(t, _)| *t)
        .collect();
    if !tight.is_empty() {
        out.push(draft(
            SuggestionType::Info,
            "Tight time budget",
            format!(
                "{} {} more work than the time left before the deadline: {}",
                tight.len(),
                if tight.len() == 1 { "task needs" } else { "tasks need" },
                example_list(&tight)
            ),
            SuggestedAction::ReassessEstimates,
            &tight,
        ));
    }

    if ranked.len() >= 3 {
        let top: Vec<&Task> = ranked.iter().take(MAX_EXAMPLES).map(|(t, _)| *t).collect();
        let order = top
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{}. {}", i + 1, t.content))
            .collect::<Vec<_>>()
            .join(", ");
        out.push(draft(
            SuggestionType::Suggestion,
            "Recommended order",
            format!("Work on: {order}"),
            SuggestedAction::FollowOrder,
            &top,
        ));
    }

    for (i, s) in out.iter_mut().enumerate() {
        s.priority_order = i as u32 + 1;
    }
    out
}

fn tasks_at<'a>(
    ranked: &[&'a (&'a Task, PressureClassification)],
    level: PressureLevel,
) -> Vec<&'a Task> {
    ranked
        .iter()
        .filter(|(_, c)| c.level == level)
        .map(|(t, _)| *t)
        .collect()
}

fn draft(
    kind: SuggestionType,
    title: &str,
    message: String,
    action: SuggestedAction,
    examples: &[&Task],
) -> Suggestion {
    Suggestion {
        kind,
        title: title.to_string(),
        message,
        action,
        tasks: examples.iter().take(MAX_EXAMPLES).map(|t| t.to_ref()).collect(),
        priority_order: 0,
    }
}

fn example_list(tasks: &[&Task]) -> String {
    let mut names: Vec<String> = tasks
        .iter()
        .take(MAX_EXAMPLES)
        .map(|t| format!("\"{}\"", t.content))
        .collect();
    if tasks.len() > MAX_EXAMPLES {
        names.push(format!("and {} more", tasks.len() - MAX_EXAMPLES));
    }
    names.join(", ")
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn due(id: &str, minutes: i64) -> Task {
        Task::new(id)
            .with_id(id)
            .with_estimate(15)
            .with_deadline(now() + Duration::minutes(minutes))
    }

    fn kinds(suggestions: &[Suggestion]) -> Vec<SuggestionType> {
        suggestions.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn empty_task_list_yields_nothing() {
        assert!(suggest(&[], now()).is_empty());
    }

    #[test]
    fn overdue_suggestion_truncates_examples() {
        let tasks: Vec<Task> = (1..=5).map(|i| due(&format!("late{i}"), -10 * i)).collect();
        let out = suggest(&tasks, now());

        assert_eq!(out[0].kind, SuggestionType::Critical);
        assert_eq!(out[0].priority_order, 1);
        assert_eq!(out[0].tasks.len(), MAX_EXAMPLES);
        assert!(out[0].message.starts_with("You have 5 overdue tasks"));
        assert!(out[0].message.ends_with("and 2 more"));
    }

    #[test]
    fn two_critical_tasks_trigger_warning() {
        let tasks = vec![due("a", 30), due("b", 120)];
        let out = suggest(&tasks, now());
        assert_eq!(kinds(&out), vec![SuggestionType::Warning]);
        assert_eq!(out[0].action, SuggestedAction::FocusCritical);
        // "a" ranks first: both CRITICAL, 95 beats 93
        assert_eq!(out[0].tasks[0].id, "a");
    }

    #[test]
    fn single_critical_task_is_not_a_warning() {
        let out = suggest(&[due("a", 30)], now());
        assert!(out.is_empty());
    }

    #[test]
    fn overcommitted_window_adds_warning() {
        let tasks = vec![
            due("a", 40).with_estimate(50),
            due("b", 50).with_estimate(50),
        ];
        let out = suggest(&tasks, now());
        let conflict = out
            .iter()
            .find(|s| s.action == SuggestedAction::RebalanceWindow)
            .unwrap();
        assert_eq!(conflict.title, "Overcommitted next hour");
        assert_eq!(conflict.tasks.len(), 2);
    }

    #[test]
    fn high_tier_with_tight_budget_emits_info() {
        // 12h left, 20h of urgent work
        let task = due("big", 12 * 60)
            .with_estimate(20 * 60)
            .with_priority(Priority::Urgent);
        let out = suggest(&[task], now());
        assert!(out.iter().any(|s| s.kind == SuggestionType::Info));
    }

    #[test]
    fn three_active_tasks_get_recommended_order() {
        let tasks = vec![
            due("later", 10 * 24 * 60),
            due("soon", 3 * 60),
            due("mid", 2 * 24 * 60),
            due("done", 60).complete(10, now()),
        ];
        let out = suggest(&tasks, now());
        let order = out.last().unwrap();
        assert_eq!(order.kind, SuggestionType::Suggestion);
        let ids: Vec<&str> = order.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "mid", "later"]);
        assert_eq!(order.message, "Work on: 1. soon, 2. mid, 3. later");
    }

    #[test]
    fn priority_order_is_sequential() {
        let tasks = vec![
            due("late", -30),
            due("a", 20),
            due("b", 40),
            due("c", 2 * 24 * 60),
        ];
        let out = suggest(&tasks, now());
        let orders: Vec<u32> = out.iter().map(|s| s.priority_order).collect();
        assert_eq!(orders, (1..=out.len() as u32).collect::<Vec<_>>());
        assert_eq!(out[0].kind, SuggestionType::Critical);
    }
}
