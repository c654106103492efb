//! Deadline pressure classification.
//!
//! Classifies a task into one of six pressure tiers from the time left until
//! its deadline. The classification is a pure function of `(task, now)`; it is
//! recomputed whenever it is needed and never stored.
//!
//! ## Tiers
//!
//! ```text
//! hours <  0   OVERDUE   urgency 100
//! hours <= 1   CRITICAL  urgency 95
//! hours <= 6   CRITICAL  urgency 85 + (6 - h) * 2
//! hours <= 24  HIGH      urgency 70 + (24 - h) * 0.8
//! days  <= 3   HIGH      urgency 50 + (3 - d) * 10
//! days  <= 7   MEDIUM    urgency 30 + (7 - d) * 5
//! days  <= 14  LOW       urgency 10 + (14 - d) * 2
//! otherwise    NONE      urgency 5
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PressureError;
use crate::task::Task;

/// Pressure tier, ordered from calm to overdue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PressureLevel {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
    Overdue = 5,
}

impl PressureLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            PressureLevel::None => "NONE",
            PressureLevel::Low => "LOW",
            PressureLevel::Medium => "MEDIUM",
            PressureLevel::High => "HIGH",
            PressureLevel::Critical => "CRITICAL",
            PressureLevel::Overdue => "OVERDUE",
        }
    }
}

impl From<PressureLevel> for u8 {
    fn from(level: PressureLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for PressureLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PressureLevel::None),
            1 => Ok(PressureLevel::Low),
            2 => Ok(PressureLevel::Medium),
            3 => Ok(PressureLevel::High),
            4 => Ok(PressureLevel::Critical),
            5 => Ok(PressureLevel::Overdue),
            other => Err(format!("pressure level out of range: {other}")),
        }
    }
}

/// Result of classifying one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureClassification {
    pub level: PressureLevel,
    pub name: String,
    /// 0-100
    pub urgency: u8,
    /// Hours until the deadline, or hours past it when overdue
    pub time_remaining_hours: f64,
    /// Estimated work over available time, weighted by priority
    pub pressure_ratio: Option<f64>,
    pub message: String,
}

impl PressureClassification {
    fn new(level: PressureLevel, urgency: f64, hours: f64, ratio: Option<f64>, message: String) -> Self {
        Self {
            level,
            name: level.name().to_string(),
            urgency: urgency.round().clamp(0.0, 100.0) as u8,
            time_remaining_hours: hours,
            pressure_ratio: ratio,
            message,
        }
    }

    /// Fallback for tasks that cannot be classified (no usable deadline).
    pub fn no_deadline() -> Self {
        Self::new(PressureLevel::None, 0.0, 0.0, None, "No deadline set".to_string())
    }

    fn completed() -> Self {
        Self::new(PressureLevel::None, 0.0, 0.0, None, "Completed".to_string())
    }
}

/// Classify a task, reporting why the normal path could not be taken.
///
/// Completed tasks are always `NONE`.
pub fn try_classify(task: &Task, now: DateTime<Utc>) -> Result<PressureClassification, PressureError> {
    if task.completed {
        return Ok(PressureClassification::completed());
    }
    let hours = task
        .hours_until_deadline(now)
        .ok_or_else(|| PressureError::MissingDeadline {
            task_id: task.id.clone(),
        })?;
    Ok(classify_hours(hours, task))
}

/// Classify a task. Never fails: a task without a deadline yields
/// [`PressureClassification::no_deadline`].
pub fn classify(task: &Task, now: DateTime<Utc>) -> PressureClassification {
    try_classify(task, now).unwrap_or_else(|err| {
        tracing::debug!(%err, "falling back to NONE pressure");
        PressureClassification::no_deadline()
    })
}

/// Classify every task, keeping the pairing with its source.
pub fn classify_all(tasks: &[Task], now: DateTime<Utc>) -> Vec<(&Task, PressureClassification)> {
    tasks.iter().map(|t| (t, classify(t, now))).collect()
}

fn classify_hours(hours: f64, task: &Task) -> PressureClassification {
    if hours < 0.0 {
        let late = hours.abs();
        return PressureClassification::new(
            PressureLevel::Overdue,
            100.0,
            late,
            None,
            overdue_message(late),
        );
    }

    let estimated_hours = task.estimate_or_default() as f64 / 60.0;
    let ratio = estimated_hours / hours.max(0.1) * task.priority.pressure_weight();
    let ratio = Some(ratio);

    if hours <= 1.0 {
        return PressureClassification::new(
            PressureLevel::Critical,
            95.0,
            hours,
            ratio,
            "Due within 1 hour!".to_string(),
        );
    }
    if hours <= 6.0 {
        return PressureClassification::new(
            PressureLevel::Critical,
            85.0 + (6.0 - hours) * 2.0,
            hours,
            ratio,
            format!("Due in {} hours", hours.ceil() as u32),
        );
    }
    if hours <= 24.0 {
        return PressureClassification::new(
            PressureLevel::High,
            70.0 + (24.0 - hours) * 0.8,
            hours,
            ratio,
            "Due today!".to_string(),
        );
    }

    let days = hours / 24.0;
    let (level, urgency, message) = if days <= 3.0 {
        (PressureLevel::High, 50.0 + (3.0 - days) * 10.0, days_message(days))
    } else if days <= 7.0 {
        (PressureLevel::Medium, 30.0 + (7.0 - days) * 5.0, "Due this week".to_string())
    } else if days <= 14.0 {
        (PressureLevel::Low, 10.0 + (14.0 - days) * 2.0, days_message(days))
    } else {
        (PressureLevel::None, 5.0, "Plenty of time".to_string())
    };
    PressureClassification::new(level, urgency, hours, ratio, message)
}

fn days_message(days: f64) -> String {
    format!("Due in {} days", days.ceil() as u32)
}

fn overdue_message(late_hours: f64) -> String {
    if late_hours < 1.0 {
        format!("Overdue by {} minutes", (late_hours * 60.0).round().max(1.0) as u32)
    } else if late_hours < 48.0 {
        format!("Overdue by {} hours", late_hours.round() as u32)
    } else {
        format!("Overdue by {} days", (late_hours / 24.0).round() as u32)
    }
}

/// Per-level counts over a set of classifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PressureSummary {
    pub none: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    pub overdue: usize,
}

impl PressureSummary {
    pub fn total(&self) -> usize {
        self.none + self.low + self.medium + self.high + self.critical + self.overdue
    }

    /// Tasks at HIGH or above.
    pub fn pressing(&self) -> usize {
        self.high + self.critical + self.overdue
    }
}

/// Count classifications per level.
pub fn summarize<'a, I>(classifications: I) -> PressureSummary
where
    I: IntoIterator<Item = &'a PressureClassification>,
{
    let mut summary = PressureSummary::default();
    for c in classifications {
        match c.level {
            PressureLevel::None => summary.none += 1,
            PressureLevel::Low => summary.low += 1,
            PressureLevel::Medium => summary.medium += 1,
            PressureLevel::High => summary.high += 1,
            PressureLevel::Critical => summary.critical += 1,
            PressureLevel::Overdue => summary.overdue += 1,
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    fn due_in(minutes: i64) -> Task {
        Task::new("t").with_id("t").with_deadline(now() + Duration::minutes(minutes))
    }

    #[test]
    fn urgent_task_due_in_thirty_minutes_is_critical() {
        let task = due_in(30).with_priority(Priority::Urgent).with_estimate(60);
        let c = classify(&task, now());
        assert_eq!(c.level, PressureLevel::Critical);
        assert_eq!(c.urgency, 95);
        assert_eq!(c.message, "Due within 1 hour!");
        // 1h of work in 0.5h, weighted 1.6
        assert!((c.pressure_ratio.unwrap() - 3.2).abs() < 1e-9);
    }

    #[test]
    fn past_deadline_is_overdue() {
        let c = classify(&due_in(-150), now());
        assert_eq!(c.level, PressureLevel::Overdue);
        assert_eq!(c.urgency, 100);
        assert!((c.time_remaining_hours - 2.5).abs() < 1e-9);
        assert_eq!(c.message, "Overdue by 3 hours");
        assert_eq!(c.pressure_ratio, None);
    }

    #[test]
    fn tier_boundaries_are_inclusive_on_the_upper_edge() {
        let cases = [
            (60, PressureLevel::Critical, 95),
            (6 * 60, PressureLevel::Critical, 85),
            (24 * 60, PressureLevel::High, 70),
            (3 * 24 * 60, PressureLevel::High, 50),
            (7 * 24 * 60, PressureLevel::Medium, 30),
            (14 * 24 * 60, PressureLevel::Low, 10),
            (15 * 24 * 60, PressureLevel::None, 5),
        ];
        for (minutes, level, urgency) in cases {
            let c = classify(&due_in(minutes), now());
            assert_eq!(c.level, level, "minutes={minutes}");
            assert_eq!(c.urgency, urgency, "minutes={minutes}");
        }
    }

    #[test]
    fn intermediate_urgency_follows_linear_ramp() {
        // 3 hours left: 85 + 3 * 2
        assert_eq!(classify(&due_in(180), now()).urgency, 91);
        // 12 hours left: 70 + 12 * 0.8 = 79.6
        assert_eq!(classify(&due_in(12 * 60), now()).urgency, 80);
        // 2 days left: 50 + 1 * 10
        assert_eq!(classify(&due_in(48 * 60), now()).urgency, 60);
    }

    #[test]
    fn messages_match_tier() {
        assert_eq!(classify(&due_in(150), now()).message, "Due in 3 hours");
        assert_eq!(classify(&due_in(20 * 60), now()).message, "Due today!");
        assert_eq!(classify(&due_in(36 * 60), now()).message, "Due in 2 days");
        assert_eq!(classify(&due_in(5 * 24 * 60), now()).message, "Due this week");
        assert_eq!(classify(&due_in(30 * 24 * 60), now()).message, "Plenty of time");
    }

    #[test]
    fn missing_deadline_falls_back_to_none() {
        let task = Task::new("someday").with_id("s-1");
        assert_eq!(
            try_classify(&task, now()),
            Err(PressureError::MissingDeadline {
                task_id: "s-1".to_string()
            })
        );
        let c = classify(&task, now());
        assert_eq!(c.level, PressureLevel::None);
        assert_eq!(c.message, "No deadline set");
    }

    #[test]
    fn completed_task_has_no_pressure() {
        let task = due_in(-30).complete(20, now());
        let c = classify(&task, now());
        assert_eq!(c.level, PressureLevel::None);
        assert_eq!(c.message, "Completed");
    }

    #[test]
    fn level_serializes_as_number() {
        let c = classify(&due_in(30), now());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["level"], 4);
        assert_eq!(json["name"], "CRITICAL");
    }

    #[test]
    fn summarize_counts_levels() {
        let tasks = vec![due_in(-10), due_in(30), due_in(45), due_in(30 * 24 * 60)];
        let classified = classify_all(&tasks, now());
        let summary = summarize(classified.iter().map(|(_, c)| c));
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.critical, 2);
        assert_eq!(summary.none, 1);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.pressing(), 3);
    }
}
